//! 几何工具函数
//! Box geometry helpers shared by the tracker and the feature extractor

use super::types::BBox;

/// 计算两个边界框的IOU (Intersection over Union)
///
/// 无重叠时返回 0.0; 交集宽高先截断到 >= 0 再相乘.
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter_w = (x2 - x1).max(0.0);
    let inter_h = (y2 - y1).max(0.0);
    let intersection = inter_w * inter_h;
    if intersection <= 0.0 {
        return 0.0;
    }

    let union = a.area() + b.area() - intersection;
    if union <= 0.0 {
        return 0.0;
    }

    (intersection / union).clamp(0.0, 1.0)
}

/// 中心点 (两个 x 与两个 y 的平均)
pub fn bbox_center(bbox: &BBox) -> (f32, f32) {
    ((bbox.x1 + bbox.x2) / 2.0, (bbox.y1 + bbox.y2) / 2.0)
}

/// 点是否在矩形内 (含边界)
pub fn point_in_rect(x: f32, y: f32, rect: &BBox) -> bool {
    rect.x1 <= x && x <= rect.x2 && rect.y1 <= y && y <= rect.y2
}
