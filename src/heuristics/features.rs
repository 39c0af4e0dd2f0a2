// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 场景特征提取
//! Reduces the live tracks of one frame to a fixed feature map

use serde::{Deserialize, Serialize};

use super::schedule::OperatingHours;
use crate::camera::CameraType;
use crate::detection::{ObjectClass, Track};
use crate::roi::Roi;

/// 特征向量的固定顺序 (供下游学习模型使用)
pub const FEATURE_KEYS: [&str; 10] = [
    "after_hours",
    "late_night",
    "num_people",
    "num_cars",
    "num_people_near_atm",
    "num_cars_in_parking",
    "max_loiter_time_atm",
    "max_parked_time_after_hours",
    "cam_is_atm",
    "cam_is_parking",
];

/// 单帧场景特征 (每帧重新计算, 不持久化)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneFeatures {
    pub camera_type: CameraType,
    pub after_hours: bool,
    pub late_night: bool,
    pub num_people: u32,
    /// 车辆总数 (car / truck / bus / motorbike)
    pub num_cars: u32,
    /// 中心点在 ATM 区域内的人数
    pub num_people_near_atm: u32,
    /// 中心点在停车区域内的车辆数
    pub num_cars_in_parking: u32,
    /// 所有人员轨迹 ATM 区域驻留时间的最大值 (秒)
    pub max_loiter_time_atm: f64,
    /// 非营业时间内车辆停车区驻留时间的最大值 (秒)
    pub max_parked_time_after_hours: f64,
}

impl SceneFeatures {
    /// 按 `FEATURE_KEYS` 顺序展开, 布尔值记为 0/1
    pub fn to_vector(&self) -> Vec<f32> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        vec![
            flag(self.after_hours),
            flag(self.late_night),
            self.num_people as f32,
            self.num_cars as f32,
            self.num_people_near_atm as f32,
            self.num_cars_in_parking as f32,
            self.max_loiter_time_atm as f32,
            self.max_parked_time_after_hours as f32,
            flag(self.camera_type == CameraType::Atm),
            flag(self.camera_type == CameraType::Parking),
        ]
    }
}

/// 从当前活跃轨迹提取特征
pub fn extract_features(
    tracks: &[Track],
    camera_type: &CameraType,
    atm_roi: &Roi,
    parking_roi: &Roi,
    timestamp: f64,
    hours: &OperatingHours,
) -> SceneFeatures {
    let tod = hours.classify(timestamp);
    let mut features = SceneFeatures {
        camera_type: camera_type.clone(),
        after_hours: tod.after_hours,
        late_night: tod.late_night,
        ..SceneFeatures::default()
    };

    for track in tracks {
        let Some(class) = ObjectClass::from_name(&track.class_name) else {
            continue;
        };
        let (cx, cy) = track.center();

        if class == ObjectClass::Person {
            features.num_people += 1;
            if atm_roi.contains(cx, cy) {
                features.num_people_near_atm += 1;
            }
            features.max_loiter_time_atm = features.max_loiter_time_atm.max(track.time_in_atm_roi);
        } else if class.is_vehicle() {
            features.num_cars += 1;
            if parking_roi.contains(cx, cy) {
                features.num_cars_in_parking += 1;
            }
            if features.after_hours {
                features.max_parked_time_after_hours = features
                    .max_parked_time_after_hours
                    .max(track.time_in_parking_roi);
            }
        }
    }

    features
}
