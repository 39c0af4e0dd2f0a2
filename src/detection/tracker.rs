//! 简单 IOU 跟踪器 + ROI 驻留计时
//! Lightweight IoU tracker with per-track dwell-time accounting
//!
//! 每帧流程:
//! 1. 删除超时轨迹 (先于匹配, 过期身份不参与竞争)
//! 2. 同类别贪心 IOU 匹配
//! 3. 匹配成功: 按上一个历史点所在区域累计驻留时间, 再更新位置
//! 4. 未匹配检测 → 新建轨迹

use std::collections::VecDeque;

use tracing::debug;

use super::geometry::{bbox_center, iou};
use super::types::{BBox, Detection};
use crate::camera::CameraType;
use crate::config::TrackerConfig;
use crate::error::ConfigError;
use crate::roi::Roi;

// ========== 公共数据结构 ==========

/// 跟踪点 (时间戳 + 中心点)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackPoint {
    pub timestamp: f64,
    pub x: f32,
    pub y: f32,
}

/// 跟踪对象
#[derive(Clone, Debug)]
pub struct Track {
    /// 唯一跟踪ID (单调递增, 不复用)
    pub track_id: u64,

    /// 创建时的检测类别, 之后不会改变
    pub class_name: String,

    /// 最近一次匹配的边界框
    pub bbox: BBox,

    /// 最近一次匹配的置信度
    pub confidence: f32,

    pub first_seen: f64,
    pub last_seen: f64,

    /// 历史轨迹 (中心点), 至少保留最后一个点
    pub history: VecDeque<TrackPoint>,

    /// 在 ATM 区域内累计的秒数
    pub time_in_atm_roi: f64,

    /// 在停车区域内累计的秒数
    pub time_in_parking_roi: f64,
}

impl Track {
    fn new(track_id: u64, det: &Detection, timestamp: f64) -> Self {
        let (x, y) = bbox_center(&det.bbox);
        let mut history = VecDeque::with_capacity(16);
        history.push_back(TrackPoint { timestamp, x, y });

        Self {
            track_id,
            class_name: det.class_name.clone(),
            bbox: det.bbox,
            confidence: det.confidence,
            first_seen: timestamp,
            last_seen: timestamp,
            history,
            time_in_atm_roi: 0.0,
            time_in_parking_roi: 0.0,
        }
    }

    /// 获取中心点
    pub fn center(&self) -> (f32, f32) {
        bbox_center(&self.bbox)
    }

    /// 最近的历史点
    pub fn last_point(&self) -> Option<&TrackPoint> {
        self.history.back()
    }

    /// 存活时长 (秒)
    pub fn age(&self) -> f64 {
        self.last_seen - self.first_seen
    }

    /// 累计驻留时间
    ///
    /// 时长按上一个历史点的位置归属, 不看新检测的位置.
    fn accrue_roi_time(
        &mut self,
        timestamp: f64,
        camera_type: &CameraType,
        atm_roi: &Roi,
        parking_roi: &Roi,
    ) {
        let Some(&prev) = self.history.back() else {
            return;
        };
        let dt = (timestamp - self.last_seen).max(0.0);

        match camera_type {
            CameraType::Atm if atm_roi.contains(prev.x, prev.y) => self.time_in_atm_roi += dt,
            CameraType::Parking if parking_roi.contains(prev.x, prev.y) => {
                self.time_in_parking_roi += dt
            }
            _ => {}
        }
    }

    /// 用新检测更新位置并追加轨迹点
    fn apply(&mut self, det: &Detection, timestamp: f64, max_history: usize) {
        self.bbox = det.bbox;
        self.confidence = det.confidence;
        self.last_seen = timestamp;

        let (x, y) = bbox_center(&det.bbox);
        self.history.push_back(TrackPoint { timestamp, x, y });

        if max_history > 0 {
            while self.history.len() > max_history.max(1) {
                self.history.pop_front();
            }
        }
    }
}

// ========== 跟踪器 ==========

/// 简单跟踪器 (单摄像头独占)
#[derive(Debug)]
pub struct SimpleTracker {
    /// 当前活跃轨迹 (按创建顺序)
    tracks: Vec<Track>,

    /// 下一个分配的ID
    next_id: u64,

    config: TrackerConfig,
}

impl SimpleTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracks: Vec::new(),
            next_id: 1,
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// 更新跟踪, 返回当前全部活跃轨迹
    ///
    /// 默认模式下, 同一帧中已匹配的轨迹仍留在候选池里, 第二个同类检测
    /// 可以再次匹配并覆盖第一次的结果. `exclusive_matching` 打开后一条
    /// 轨迹每帧只接受一个检测.
    pub fn update(
        &mut self,
        detections: &[Detection],
        timestamp: f64,
        camera_type: &CameraType,
        atm_roi: &Roi,
        parking_roi: &Roi,
    ) -> &[Track] {
        // 1. 删除超时轨迹
        let max_age = self.config.max_age_secs;
        self.tracks.retain(|t| {
            let keep = timestamp - t.last_seen <= max_age;
            if !keep {
                debug!(
                    track_id = t.track_id,
                    class = %t.class_name,
                    "轨迹超时删除"
                );
            }
            keep
        });

        // 2. 贪心匹配
        let mut claimed = vec![false; self.tracks.len()];
        let mut unmatched: Vec<&Detection> = Vec::new();

        for det in detections {
            let mut best_iou = 0.0f32;
            let mut best_idx = None;

            for (idx, track) in self.tracks.iter().enumerate() {
                if track.class_name != det.class_name {
                    continue;
                }
                if self.config.exclusive_matching && claimed[idx] {
                    continue;
                }
                let cur = iou(&track.bbox, &det.bbox);
                // 相同 IOU 保留先出现的轨迹
                if cur > best_iou {
                    best_iou = cur;
                    best_idx = Some(idx);
                }
            }

            match best_idx {
                Some(idx) if best_iou >= self.config.iou_threshold => {
                    claimed[idx] = true;
                    let track = &mut self.tracks[idx];
                    // 3. 先累计驻留时间, 再更新位置
                    track.accrue_roi_time(timestamp, camera_type, atm_roi, parking_roi);
                    track.apply(det, timestamp, self.config.max_history);
                }
                _ => unmatched.push(det),
            }
        }

        // 4. 未匹配检测 → 新建轨迹
        for det in unmatched {
            let track = Track::new(self.next_id, det, timestamp);
            debug!(
                track_id = track.track_id,
                class = %track.class_name,
                "新建轨迹"
            );
            self.tracks.push(track);
            self.next_id += 1;
        }

        &self.tracks
    }

    /// 当前活跃轨迹
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// 清除所有轨迹 (ID 继续递增)
    pub fn reset(&mut self) {
        self.tracks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATM_ROI: Roi = Roi::new(150, 80, 500, 450);
    const PARKING_ROI: Roi = Roi::new(50, 200, 1200, 700);

    fn person(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection::new(BBox::new(x1, y1, x2, y2), 0.9, "person")
    }

    fn tracker() -> SimpleTracker {
        SimpleTracker::new(TrackerConfig::default()).unwrap()
    }

    fn step(t: &mut SimpleTracker, dets: &[Detection], ts: f64) -> Vec<Track> {
        t.update(dets, ts, &CameraType::Atm, &ATM_ROI, &PARKING_ROI)
            .to_vec()
    }

    #[test]
    fn test_smooth_motion_keeps_id() {
        let mut t = tracker();
        for i in 0..10 {
            let dx = i as f32 * 5.0;
            let tracks = step(&mut t, &[person(100.0 + dx, 100.0, 150.0 + dx, 250.0)], i as f64 * 0.1);
            assert_eq!(tracks.len(), 1);
            assert_eq!(tracks[0].track_id, 1);
        }
        assert_eq!(t.tracks()[0].history.len(), 10);
        assert!((t.tracks()[0].age() - 0.9).abs() < 1e-9);
        assert_eq!(t.tracks()[0].first_seen, 0.0);
    }

    #[test]
    fn test_low_overlap_spawns_new_track() {
        let mut t = tracker();
        step(&mut t, &[person(100.0, 100.0, 150.0, 250.0)], 0.0);
        // IOU 约 0.18 < 0.3
        let tracks = step(&mut t, &[person(135.0, 100.0, 185.0, 250.0)], 0.1);
        let ids: Vec<u64> = tracks.iter().map(|tr| tr.track_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_class_change_creates_new_track() {
        let mut t = tracker();
        step(&mut t, &[person(100.0, 100.0, 150.0, 250.0)], 0.0);
        let car = Detection::new(BBox::new(100.0, 100.0, 150.0, 250.0), 0.8, "car");
        let tracks = step(&mut t, &[car], 0.1);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].class_name, "person");
        assert_eq!(tracks[1].class_name, "car");
        assert_eq!(tracks[1].track_id, 2);
    }

    #[test]
    fn test_age_out_before_matching() {
        let mut t = tracker();
        step(&mut t, &[person(100.0, 100.0, 150.0, 250.0)], 0.0);
        // 2.5 秒后同一位置出现的检测不能复用旧 ID
        let tracks = step(&mut t, &[person(100.0, 100.0, 150.0, 250.0)], 2.5);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].track_id, 2);
    }

    #[test]
    fn test_empty_detections_only_age_out() {
        let mut t = tracker();
        step(&mut t, &[person(100.0, 100.0, 150.0, 250.0)], 0.0);
        assert_eq!(step(&mut t, &[], 1.0).len(), 1);
        assert_eq!(step(&mut t, &[], 2.0).len(), 1);
        assert!(step(&mut t, &[], 2.01).is_empty());
    }

    #[test]
    fn test_dwell_time_accumulates() {
        let mut t = tracker();
        let n = 6;
        let dt = 0.5;
        for i in 0..n {
            step(&mut t, &[person(210.0, 150.0, 260.0, 380.0)], i as f64 * dt);
        }
        let track = &t.tracks()[0];
        assert!((track.time_in_atm_roi - (n - 1) as f64 * dt).abs() < 1e-9);
        assert_eq!(track.time_in_parking_roi, 0.0);
    }

    #[test]
    fn test_dwell_uses_previous_position() {
        let mut t = tracker();
        // 中心 (525, 265) 在 ATM 区域外
        step(&mut t, &[person(500.0, 150.0, 550.0, 380.0)], 0.0);
        // 移入区域: 这段时间仍算在区域外
        step(&mut t, &[person(480.0, 150.0, 530.0, 380.0)], 1.0);
        assert_eq!(t.tracks()[0].time_in_atm_roi, 0.0);
        // 上一个点 (505, 265) 仍在区域外
        step(&mut t, &[person(460.0, 150.0, 510.0, 380.0)], 2.0);
        assert_eq!(t.tracks()[0].time_in_atm_roi, 0.0);
        // 上一个点 (485, 265) 在区域内
        step(&mut t, &[person(460.0, 150.0, 510.0, 380.0)], 3.0);
        assert!((t.tracks()[0].time_in_atm_roi - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parking_time_only_for_parking_camera() {
        let mut t = tracker();
        let car = Detection::new(BBox::new(300.0, 300.0, 400.0, 380.0), 0.8, "car");
        for i in 0..3 {
            t.update(
                std::slice::from_ref(&car),
                i as f64,
                &CameraType::Parking,
                &ATM_ROI,
                &PARKING_ROI,
            );
        }
        let track = &t.tracks()[0];
        assert!((track.time_in_parking_roi - 2.0).abs() < 1e-9);
        assert_eq!(track.time_in_atm_roi, 0.0);

        let mut other = tracker();
        for i in 0..3 {
            other.update(
                std::slice::from_ref(&car),
                i as f64,
                &CameraType::parse("lobby"),
                &ATM_ROI,
                &PARKING_ROI,
            );
        }
        assert_eq!(other.tracks()[0].time_in_parking_roi, 0.0);
    }

    #[test]
    fn test_regressing_timestamp_adds_nothing() {
        let mut t = tracker();
        step(&mut t, &[person(210.0, 150.0, 260.0, 380.0)], 5.0);
        step(&mut t, &[person(210.0, 150.0, 260.0, 380.0)], 4.0);
        assert_eq!(t.tracks()[0].time_in_atm_roi, 0.0);
    }

    #[test]
    fn test_shared_pool_lets_second_detection_overwrite() {
        let mut t = tracker();
        step(&mut t, &[person(100.0, 100.0, 150.0, 250.0)], 0.0);
        let a = person(102.0, 100.0, 152.0, 250.0);
        let b = person(98.0, 102.0, 148.0, 252.0);
        let tracks = step(&mut t, &[a, b.clone()], 0.1);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].bbox, b.bbox);
        assert_eq!(tracks[0].history.len(), 3);
    }

    #[test]
    fn test_exclusive_matching_one_detection_per_track() {
        let config = TrackerConfig {
            exclusive_matching: true,
            ..TrackerConfig::default()
        };
        let mut t = SimpleTracker::new(config).unwrap();
        t.update(
            &[person(100.0, 100.0, 150.0, 250.0)],
            0.0,
            &CameraType::Atm,
            &ATM_ROI,
            &PARKING_ROI,
        );
        let a = person(102.0, 100.0, 152.0, 250.0);
        let b = person(98.0, 102.0, 148.0, 252.0);
        let tracks = t.update(&[a.clone(), b], 0.1, &CameraType::Atm, &ATM_ROI, &PARKING_ROI);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track_id, 1);
        assert_eq!(tracks[0].bbox, a.bbox);
        assert_eq!(tracks[1].track_id, 2);
    }

    #[test]
    fn test_history_bounded_keeps_latest() {
        let config = TrackerConfig {
            max_history: 3,
            ..TrackerConfig::default()
        };
        let mut t = SimpleTracker::new(config).unwrap();
        for i in 0..10 {
            t.update(
                &[person(100.0, 100.0, 150.0, 250.0)],
                i as f64 * 0.1,
                &CameraType::Atm,
                &ATM_ROI,
                &PARKING_ROI,
            );
        }
        let track = &t.tracks()[0];
        assert_eq!(track.history.len(), 3);
        assert!((track.last_point().unwrap().timestamp - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_ids_not_reused_after_reset() {
        let mut t = tracker();
        step(&mut t, &[person(100.0, 100.0, 150.0, 250.0)], 0.0);
        t.reset();
        assert!(t.is_empty());
        let tracks = step(&mut t, &[person(100.0, 100.0, 150.0, 250.0)], 0.1);
        assert_eq!(tracks[0].track_id, 2);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let bad = TrackerConfig {
            iou_threshold: -0.1,
            ..TrackerConfig::default()
        };
        assert!(SimpleTracker::new(bad).is_err());
    }
}
