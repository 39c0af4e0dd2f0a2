//! 启发式引擎配置 - 通过JSON文件调整参数
//!
//! 所有字段都有默认值, JSON 文件只需写出需要覆盖的部分.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::roi::{Roi, DEFAULT_ATM_ROI, DEFAULT_PARKING_ROI};

fn hms(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("constant time of day is valid")
}

/// 引擎总配置
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    pub tracker: TrackerConfig,
    pub schedule: ScheduleConfig,
    pub roi: RoiConfig,
    pub scoring: ScoringConfig,
}

/// 跟踪器参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub iou_threshold: f32, // 匹配 IOU 阈值 (越高越严格, 越容易碎轨)
    pub max_age_secs: f64,  // 轨迹最长未匹配时间 (秒)
    /// 为 true 时同一次 update 中一条轨迹只接受一个检测
    pub exclusive_matching: bool,
    /// 轨迹历史最多保留的点数, 0 表示不限
    pub max_history: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            max_age_secs: 2.0,
            exclusive_matching: false,
            max_history: 256,
        }
    }
}

/// 营业时间与深夜时段
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub open: NaiveTime,  // 营业开始 (含)
    pub close: NaiveTime, // 营业结束 (含)
    pub late_night_start: NaiveTime,
    pub late_night_end: NaiveTime,
    /// 固定时区偏移 (秒); None 使用本机时区
    pub utc_offset_secs: Option<i32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            open: hms(9, 0),
            close: hms(17, 0),
            late_night_start: hms(23, 0),
            late_night_end: hms(4, 0),
            utc_offset_secs: None,
        }
    }
}

/// ROI 配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// 自动识别失败时的 ATM 区域
    pub default_atm: Roi,
    /// 停车场静态区域
    pub parking: Roi,
    pub detector: RoiDetectorConfig,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            default_atm: DEFAULT_ATM_ROI,
            parking: DEFAULT_PARKING_ROI,
            detector: RoiDetectorConfig::default(),
        }
    }
}

/// ATM 区域自动识别参数 (比例均相对于图像宽高)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiDetectorConfig {
    // === 边缘检测 ===
    pub blur_sigma: f32, // 高斯模糊 sigma (5x5 核对应 1.1)
    pub canny_low: f32,
    pub canny_high: f32,

    // === 候选框过滤 ===
    pub min_area_frac: f64,     // 最小面积占比
    pub max_area_frac: f64,     // 最大面积占比
    pub max_center_x_frac: f64, // 中心点需在此宽度比例以左
    pub border_margin_px: u32,  // 距图像边缘的最小距离
    pub min_aspect: f64,        // 宽高比下限
    pub max_aspect: f64,        // 宽高比上限

    // === 站立区扩展 ===
    pub pad_x_frac: f64,      // 左右各扩展候选框宽度的比例
    pub pad_top_frac: f64,    // 向上扩展候选框高度的比例
    pub pad_bottom_frac: f64, // 向下扩展候选框高度的比例

    // === 按人员位置重新推导 ===
    pub people_pad_x_frac: f64, // 左右各扩展图像宽度的比例
    pub people_pad_y_frac: f64, // 上下各扩展图像高度的比例
}

impl Default for RoiDetectorConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,

            min_area_frac: 0.01,
            max_area_frac: 0.5,
            max_center_x_frac: 0.6,
            border_margin_px: 5,
            min_aspect: 0.4,
            max_aspect: 1.4,

            pad_x_frac: 0.25,
            pad_top_frac: 0.10,
            pad_bottom_frac: 0.80,

            people_pad_x_frac: 0.10,
            people_pad_y_frac: 0.15,
        }
    }
}

/// 危险评分规则 (分值与阈值)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    // === ATM ===
    pub crowd_min_people: u32, // 画面内多人
    pub crowd_points: i32,
    pub zone_one_points: i32,     // 交互区内至少一人
    pub zone_many_min_people: u32, // 交互区内多人 (与上一条叠加)
    pub zone_many_points: i32,
    pub loiter_secs: f64, // 逗留时间阈值 (严格大于)
    pub loiter_points: i32,
    pub atm_off_hours_points: i32, // 深夜/非营业时间

    // === 停车场 ===
    pub parking_after_hours_points: i32,
    pub parked_secs: f64, // 非营业时间停车时长阈值 (严格大于)
    pub parked_points: i32,

    // === 通用 ===
    pub late_crowd_min_people: u32,
    pub late_crowd_points: i32,

    // === 等级 ===
    pub label_threshold: i32,  // 输出标签 (HIGH) 的最低分
    pub medium_threshold: i32, // MEDIUM 最低分
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            crowd_min_people: 2,
            crowd_points: 25,
            zone_one_points: 20,
            zone_many_min_people: 2,
            zone_many_points: 25,
            loiter_secs: 5.0,
            loiter_points: 20,
            atm_off_hours_points: 10,

            parking_after_hours_points: 40,
            parked_secs: 600.0,
            parked_points: 25,

            late_crowd_min_people: 5,
            late_crowd_points: 10,

            label_threshold: 60,
            medium_threshold: 40,
        }
    }
}

impl HeuristicConfig {
    /// 从JSON字符串解析并校验
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 从JSON文件加载配置; 文件不存在时写出默认配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let config = Self::from_json_str(&json)?;
                info!("✅ 配置已从 {} 加载", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("📝 配置文件 {} 不存在,创建默认配置...", path.display());
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 校验参数范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.schedule.validate()?;
        self.roi.validate()?;
        self.scoring.validate()
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(ConfigError::invalid(
                "tracker.iou_threshold",
                format!("{} is outside [0, 1]", self.iou_threshold),
            ));
        }
        if !self.max_age_secs.is_finite() || self.max_age_secs < 0.0 {
            return Err(ConfigError::invalid(
                "tracker.max_age_secs",
                format!("{} must be a finite non-negative number", self.max_age_secs),
            ));
        }
        Ok(())
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(offset) = self.utc_offset_secs {
            if offset.abs() >= 86_400 {
                return Err(ConfigError::invalid(
                    "schedule.utc_offset_secs",
                    format!("{} is not within one day", offset),
                ));
            }
        }
        Ok(())
    }
}

impl RoiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_atm.is_valid() {
            return Err(ConfigError::invalid(
                "roi.default_atm",
                format!("{} has inverted corners", self.default_atm),
            ));
        }
        if !self.parking.is_valid() {
            return Err(ConfigError::invalid(
                "roi.parking",
                format!("{} has inverted corners", self.parking),
            ));
        }
        self.detector.validate()
    }
}

impl RoiDetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fractions = [
            ("roi.detector.min_area_frac", self.min_area_frac),
            ("roi.detector.max_area_frac", self.max_area_frac),
            ("roi.detector.max_center_x_frac", self.max_center_x_frac),
            ("roi.detector.pad_x_frac", self.pad_x_frac),
            ("roi.detector.pad_top_frac", self.pad_top_frac),
            ("roi.detector.pad_bottom_frac", self.pad_bottom_frac),
            ("roi.detector.people_pad_x_frac", self.people_pad_x_frac),
            ("roi.detector.people_pad_y_frac", self.people_pad_y_frac),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(
                    field,
                    format!("{} is outside [0, 1]", value),
                ));
            }
        }
        if self.min_area_frac > self.max_area_frac {
            return Err(ConfigError::invalid(
                "roi.detector.min_area_frac",
                "must not exceed max_area_frac",
            ));
        }
        if !(self.min_aspect > 0.0 && self.min_aspect <= self.max_aspect) {
            return Err(ConfigError::invalid(
                "roi.detector.min_aspect",
                "must be positive and not exceed max_aspect",
            ));
        }
        if !(self.blur_sigma > 0.0) {
            return Err(ConfigError::invalid(
                "roi.detector.blur_sigma",
                "must be positive",
            ));
        }
        if self.canny_low < 0.0 || self.canny_low > self.canny_high {
            return Err(ConfigError::invalid(
                "roi.detector.canny_low",
                "must be non-negative and not exceed canny_high",
            ));
        }
        Ok(())
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.loiter_secs >= 0.0) {
            return Err(ConfigError::invalid(
                "scoring.loiter_secs",
                "must be non-negative",
            ));
        }
        if !(self.parked_secs >= 0.0) {
            return Err(ConfigError::invalid(
                "scoring.parked_secs",
                "must be non-negative",
            ));
        }
        if self.medium_threshold > self.label_threshold {
            return Err(ConfigError::invalid(
                "scoring.medium_threshold",
                format!(
                    "{} exceeds label_threshold {}",
                    self.medium_threshold, self.label_threshold
                ),
            ));
        }
        Ok(())
    }
}
