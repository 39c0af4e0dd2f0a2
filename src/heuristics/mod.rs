/// 行为启发式 (Behavioral heuristics)
///
/// - Schedule: 营业时间 / 深夜判断
/// - Features: 轨迹 → 场景特征
/// - Scoring:  特征 → 危险分数与标签
/// - Engine:   单摄像头编排 (ROI 初始化, 跟踪, 评分, 判定)
pub mod engine;
pub mod features;
pub mod schedule;
pub mod scoring;

pub use engine::{DangerLevel, HeuristicEngine, Verdict};
pub use features::{extract_features, SceneFeatures, FEATURE_KEYS};
pub use schedule::{OperatingHours, TimeOfDay};
pub use scoring::{compute_danger_score, DangerAssessment, DangerLabel, MAX_SCORE};
