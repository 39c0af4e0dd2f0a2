// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 单摄像头启发式引擎
//! Per-camera orchestrator: ROI bootstrap → tracking → features → score → verdict
//!
//! 每路摄像头独占一个引擎实例, 调用方需按时间戳非递减的顺序逐帧调用.

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::features::{extract_features, SceneFeatures};
use super::schedule::OperatingHours;
use super::scoring::{compute_danger_score, DangerAssessment, DangerLabel};
use crate::camera::CameraType;
use crate::config::HeuristicConfig;
use crate::detection::{Detection, SimpleTracker, Track};
use crate::error::ConfigError;
use crate::roi::{fallback_roi_from_people, Roi, RoiDetector};

/// 危险等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DangerLevel {
    Low,
    Medium,
    High,
}

impl DangerLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单帧判定结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub danger_level: DangerLevel,
    pub score: u8,
    pub labels: Vec<DangerLabel>,
    pub reasons: Vec<String>,
    /// 画面叠加文字; LOW 时为 None
    pub overlay_text: Option<String>,
}

/// 启发式引擎
#[derive(Debug)]
pub struct HeuristicEngine {
    camera_type: CameraType,
    config: HeuristicConfig,
    tracker: SimpleTracker,
    roi_detector: RoiDetector,
    hours: OperatingHours,
    atm_roi: Option<Roi>,
    parking_roi: Roi,
}

impl HeuristicEngine {
    /// 创建引擎; 配置非法时立即失败
    pub fn new(camera_type: CameraType, config: HeuristicConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tracker = SimpleTracker::new(config.tracker.clone())?;
        let roi_detector = RoiDetector::new(config.roi.detector.clone());
        let hours = OperatingHours::new(config.schedule.clone());
        let parking_roi = config.roi.parking;

        if !camera_type.is_monitored() {
            info!(camera_type = %camera_type, "⏸️ 摄像头类型不做行为分析, 引擎空转");
        }

        Ok(Self {
            camera_type,
            config,
            tracker,
            roi_detector,
            hours,
            atm_roi: None,
            parking_roi,
        })
    }

    /// 预先指定 ATM 区域, 跳过首帧自动识别
    pub fn with_atm_roi(mut self, roi: Roi) -> Self {
        self.atm_roi = Some(roi);
        self
    }

    pub fn camera_type(&self) -> &CameraType {
        &self.camera_type
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// 当前 ATM 区域 (ATM 摄像头首帧之前为 None)
    pub fn atm_roi(&self) -> Option<Roi> {
        self.atm_roi
    }

    pub fn parking_roi(&self) -> Roi {
        self.parking_roi
    }

    pub fn tracks(&self) -> &[Track] {
        self.tracker.tracks()
    }

    /// 清空轨迹和 ATM 区域, 下一帧重新识别
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.atm_roi = None;
    }

    /// 处理一帧, 没有可报告内容时返回 None
    pub fn process_frame(
        &mut self,
        frame: &DynamicImage,
        detections: &[Detection],
        timestamp: f64,
    ) -> Option<Verdict> {
        if !self.camera_type.is_monitored() {
            return None;
        }

        // ========== ATM 区域初始化 ==========
        if self.camera_type == CameraType::Atm && self.atm_roi.is_none() {
            let roi = match self.roi_detector.detect(frame) {
                Ok(roi) => {
                    info!(roi = %roi, "🎯 ATM 区域自动识别完成");
                    roi
                }
                Err(e) => {
                    warn!(error = %e, "⚠️ ATM 区域识别失败, 使用默认区域");
                    self.config.roi.default_atm
                }
            };
            self.atm_roi = Some(roi);
        }
        let atm_roi = self.atm_roi.unwrap_or(self.config.roi.default_atm);

        // ========== 跟踪 ==========
        let trackable: Vec<Detection> = detections
            .iter()
            .filter(|d| d.is_trackable())
            .cloned()
            .collect();
        self.tracker.update(
            &trackable,
            timestamp,
            &self.camera_type,
            &atm_roi,
            &self.parking_roi,
        );
        let tracks = self.tracker.tracks();
        if tracks.is_empty() {
            return None;
        }

        // ========== 特征与评分 ==========
        let mut features = self.features(tracks, &atm_roi, timestamp);
        let mut assessment = compute_danger_score(&features, &self.config.scoring);

        // 有人但交互区内无人: 按人员位置重新推导 ATM 区域 (每帧都会检查)
        if self.camera_type == CameraType::Atm
            && features.num_people > 0
            && features.num_people_near_atm == 0
        {
            if let Some(roi) = fallback_roi_from_people(
                tracks,
                frame.width(),
                frame.height(),
                &self.config.roi.detector,
            ) {
                debug!(old = %atm_roi, new = %roi, "🔄 ATM 区域按人员位置重新推导");
                self.atm_roi = Some(roi);
                let tracks = self.tracker.tracks();
                features = self.features(tracks, &roi, timestamp);
                assessment = compute_danger_score(&features, &self.config.scoring);
            }
        }

        let verdict = build_verdict(assessment, self.config.scoring.medium_threshold);
        debug!(
            camera_type = %self.camera_type,
            level = %verdict.danger_level,
            score = verdict.score,
            tracks = self.tracker.len(),
            "帧判定"
        );
        Some(verdict)
    }

    fn features(&self, tracks: &[Track], atm_roi: &Roi, timestamp: f64) -> SceneFeatures {
        extract_features(
            tracks,
            &self.camera_type,
            atm_roi,
            &self.parking_roi,
            timestamp,
            &self.hours,
        )
    }
}

/// 分数 → 等级与叠加文字
fn build_verdict(assessment: DangerAssessment, medium_threshold: i32) -> Verdict {
    let DangerAssessment {
        score,
        reasons,
        labels,
    } = assessment;

    let danger_level = if !labels.is_empty() {
        DangerLevel::High
    } else if score as i32 >= medium_threshold {
        DangerLevel::Medium
    } else {
        DangerLevel::Low
    };

    let overlay_text = match (labels.first(), danger_level) {
        (Some(label), _) => Some(format!("{} ({})", label, score)),
        (None, DangerLevel::Medium) => Some(format!("Suspicious activity ({})", score)),
        _ => None,
    };

    Verdict {
        danger_level,
        score,
        labels,
        reasons,
        overlay_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BBox;
    use image::RgbImage;

    fn blank() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(640, 480))
    }

    fn utc_config() -> HeuristicConfig {
        let mut config = HeuristicConfig::default();
        config.schedule.utc_offset_secs = Some(0);
        config
    }

    #[test]
    fn test_build_verdict_levels() {
        let high = build_verdict(
            DangerAssessment {
                score: 70,
                reasons: vec![],
                labels: vec![DangerLabel::AtmFraudSuspected],
            },
            40,
        );
        assert_eq!(high.danger_level, DangerLevel::High);
        assert_eq!(high.overlay_text.as_deref(), Some("ATM_FRAUD_SUSPECTED (70)"));

        let medium = build_verdict(
            DangerAssessment {
                score: 40,
                ..DangerAssessment::default()
            },
            40,
        );
        assert_eq!(medium.danger_level, DangerLevel::Medium);
        assert_eq!(
            medium.overlay_text.as_deref(),
            Some("Suspicious activity (40)")
        );

        let low = build_verdict(
            DangerAssessment {
                score: 39,
                ..DangerAssessment::default()
            },
            40,
        );
        assert_eq!(low.danger_level, DangerLevel::Low);
        assert_eq!(low.overlay_text, None);
    }

    #[test]
    fn test_inert_camera_returns_none() {
        let mut engine =
            HeuristicEngine::new(CameraType::parse("lobby"), utc_config()).unwrap();
        let det = Detection::new(BBox::new(10.0, 10.0, 50.0, 100.0), 0.9, "person");
        assert_eq!(engine.process_frame(&blank(), &[det], 0.0), None);
        assert!(engine.tracks().is_empty());
        assert_eq!(engine.atm_roi(), None);
    }

    #[test]
    fn test_roi_bootstrap_on_first_frame() {
        let mut engine = HeuristicEngine::new(CameraType::Atm, utc_config()).unwrap();
        assert_eq!(engine.process_frame(&blank(), &[], 0.0), None);
        assert_eq!(engine.atm_roi(), Some(Roi::new(0, 9, 352, 479)));
    }

    #[test]
    fn test_empty_frame_falls_back_to_default_roi() {
        let mut engine = HeuristicEngine::new(CameraType::Atm, utc_config()).unwrap();
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        engine.process_frame(&empty, &[], 0.0);
        assert_eq!(engine.atm_roi(), Some(crate::roi::DEFAULT_ATM_ROI));
    }

    #[test]
    fn test_untrackable_classes_are_ignored() {
        let mut engine = HeuristicEngine::new(CameraType::Parking, utc_config()).unwrap();
        let dets = [
            Detection::new(BBox::new(100.0, 300.0, 200.0, 400.0), 0.9, "dog"),
            Detection::new(BBox::new(300.0, 300.0, 400.0, 400.0), 0.9, "bicycle"),
        ];
        assert_eq!(engine.process_frame(&blank(), &dets, 0.0), None);
        assert!(engine.tracks().is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = utc_config();
        config.tracker.max_age_secs = -1.0;
        assert!(HeuristicEngine::new(CameraType::Atm, config).is_err());
    }

    #[test]
    fn test_reset_clears_roi_and_tracks() {
        let mut engine = HeuristicEngine::new(CameraType::Atm, utc_config())
            .unwrap()
            .with_atm_roi(Roi::new(150, 80, 500, 450));
        let det = Detection::new(BBox::new(210.0, 150.0, 260.0, 380.0), 0.9, "person");
        assert!(engine.process_frame(&blank(), &[det], 0.0).is_some());
        assert_eq!(engine.tracks().len(), 1);

        engine.reset();
        assert!(engine.tracks().is_empty());
        assert_eq!(engine.atm_roi(), None);
    }

    #[test]
    fn test_verdict_json_shape() {
        let verdict = Verdict {
            danger_level: DangerLevel::Medium,
            score: 40,
            labels: vec![],
            reasons: vec!["Person in ATM interaction zone".into()],
            overlay_text: Some("Suspicious activity (40)".into()),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["danger_level"], "MEDIUM");
        assert_eq!(json["score"], 40);
        assert_eq!(json["overlay_text"], "Suspicious activity (40)");
    }
}
