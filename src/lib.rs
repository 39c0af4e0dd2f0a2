// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 数字卫兵行为分析核心 (Sentinel behavioral heuristics)
//!
//! 输入外部检测器的逐帧结果, 输出每帧的危险判定:
//! 1. ROI:        ATM 交互区自动识别 / 停车场静态区域
//! 2. Detection:  IOU 跟踪 + ROI 驻留计时
//! 3. Heuristics: 场景特征 → 规则评分 → 判定 (LOW / MEDIUM / HIGH)
//! 4. Registry:   每路摄像头一个独立引擎

pub mod camera; // 摄像头行为类型
pub mod config; // 引擎配置参数
pub mod detection; // 检测类型与跟踪
pub mod error; // 错误类型
pub mod heuristics; // 特征, 评分与引擎
pub mod registry; // 摄像头注册表
pub mod roi; // 关注区域

pub use crate::camera::CameraType;
pub use crate::config::{
    HeuristicConfig, RoiConfig, RoiDetectorConfig, ScheduleConfig, ScoringConfig, TrackerConfig,
};
pub use crate::detection::{iou, BBox, Detection, ObjectClass, SimpleTracker, Track, TrackPoint};
pub use crate::error::{ConfigError, RegistryError, RoiError};
pub use crate::heuristics::{
    compute_danger_score, extract_features, DangerAssessment, DangerLabel, DangerLevel,
    HeuristicEngine, SceneFeatures, Verdict, FEATURE_KEYS,
};
pub use crate::registry::CameraRegistry;
pub use crate::roi::{auto_detect::auto_detect_atm_roi, Roi, RoiDetector};
