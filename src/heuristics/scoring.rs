// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 危险评分 (按摄像头类型累加规则分值)

use std::fmt;

use serde::{Deserialize, Serialize};

use super::features::SceneFeatures;
use crate::camera::CameraType;
use crate::config::ScoringConfig;

pub const MAX_SCORE: u8 = 100;

/// 告警标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DangerLabel {
    AtmFraudSuspected,
    UnauthorizedParkingAfterHours,
}

impl DangerLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtmFraudSuspected => "ATM_FRAUD_SUSPECTED",
            Self::UnauthorizedParkingAfterHours => "UNAUTHORIZED_PARKING_AFTER_HOURS",
        }
    }
}

impl fmt::Display for DangerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 评分结果; `reasons` 按规则检查顺序排列
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DangerAssessment {
    pub score: u8,
    pub reasons: Vec<String>,
    pub labels: Vec<DangerLabel>,
}

/// 计算危险分数 (0..=100)
pub fn compute_danger_score(features: &SceneFeatures, config: &ScoringConfig) -> DangerAssessment {
    let mut score: i64 = 0;
    let mut reasons = Vec::new();
    let mut add = |points: i32, reason: String| {
        score += points as i64;
        reasons.push(reason);
    };

    match features.camera_type {
        CameraType::Atm => {
            if features.num_people >= config.crowd_min_people {
                add(config.crowd_points, "Multiple people in ATM camera view".into());
            }
            // 两条交互区规则可以同时命中
            if features.num_people_near_atm >= 1 {
                add(config.zone_one_points, "Person in ATM interaction zone".into());
            }
            if features.num_people_near_atm >= config.zone_many_min_people {
                add(
                    config.zone_many_points,
                    "Multiple people in ATM interaction zone".into(),
                );
            }
            if features.max_loiter_time_atm > config.loiter_secs {
                add(
                    config.loiter_points,
                    format!("Person loitering near ATM >{}s", config.loiter_secs),
                );
            }
            if features.late_night || features.after_hours {
                add(
                    config.atm_off_hours_points,
                    "ATM activity during late night / after hours".into(),
                );
            }
        }
        CameraType::Parking => {
            if features.after_hours && features.num_cars_in_parking > 0 {
                add(
                    config.parking_after_hours_points,
                    "Vehicle present in parking lot after hours".into(),
                );
            }
            if features.max_parked_time_after_hours > config.parked_secs {
                add(
                    config.parked_points,
                    format!(
                        "Vehicle parked >{} minutes after hours",
                        config.parked_secs / 60.0
                    ),
                );
            }
        }
        CameraType::Other(_) => {}
    }

    if features.num_people >= config.late_crowd_min_people && features.late_night {
        add(
            config.late_crowd_points,
            "Crowd detected during late night".into(),
        );
    }

    let score = score.clamp(0, MAX_SCORE as i64) as u8;

    let mut labels = Vec::new();
    if score as i32 >= config.label_threshold {
        match features.camera_type {
            CameraType::Atm => labels.push(DangerLabel::AtmFraudSuspected),
            CameraType::Parking => labels.push(DangerLabel::UnauthorizedParkingAfterHours),
            CameraType::Other(_) => {}
        }
    }

    DangerAssessment {
        score,
        reasons,
        labels,
    }
}
