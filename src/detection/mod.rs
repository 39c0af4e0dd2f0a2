/// 检测与跟踪 (Detection & Tracking)
///
/// 外部检测器只提供 `{bbox, confidence, class_name}`, 这里负责其余部分
/// - Types:    检测框 / 检测结果 / 可跟踪类别
/// - Geometry: IOU / 中心点 / 点在矩形内
/// - Tracker:  IOU 跟踪 + ROI 驻留计时
pub mod geometry;
pub mod tracker;
pub mod types;

pub use geometry::{bbox_center, iou, point_in_rect};
pub use tracker::{SimpleTracker, Track, TrackPoint};
pub use types::{BBox, Detection, ObjectClass};
