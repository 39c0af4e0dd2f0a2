/// 感兴趣区域 (Region of Interest)
///
/// - `Roi`:         摄像头作用域的整数像素矩形
/// - `auto_detect`: 从单帧图像推断 ATM 交互区, 以及按人员位置重新推导
pub mod auto_detect;

pub use auto_detect::{fallback_roi_from_people, RoiDetector};

use serde::{Deserialize, Serialize};

use crate::detection::geometry::point_in_rect;
use crate::detection::BBox;

/// ATM 区域识别失败时使用的默认矩形
pub const DEFAULT_ATM_ROI: Roi = Roi::new(200, 100, 450, 400);

/// 停车场静态区域
pub const DEFAULT_PARKING_ROI: Roi = Roi::new(50, 200, 1200, 700);

/// 轴对齐矩形 (x1, y1, x2, y2), 像素坐标
///
/// JSON 中写作 `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Roi {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Roi {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn is_valid(&self) -> bool {
        self.x2 >= self.x1 && self.y2 >= self.y1
    }

    pub fn to_bbox(&self) -> BBox {
        BBox::new(
            self.x1 as f32,
            self.y1 as f32,
            self.x2 as f32,
            self.y2 as f32,
        )
    }

    /// 点是否在区域内 (含边界)
    pub fn contains(&self, x: f32, y: f32) -> bool {
        point_in_rect(x, y, &self.to_bbox())
    }

    /// 检测框是否完整落在区域内
    pub fn contains_bbox(&self, bbox: &BBox) -> bool {
        self.contains(bbox.x1, bbox.y1) && self.contains(bbox.x2, bbox.y2)
    }

    /// 截断到图像范围 [0, w-1] x [0, h-1]
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let max_x = width.saturating_sub(1) as i32;
        let max_y = height.saturating_sub(1) as i32;
        Self {
            x1: self.x1.clamp(0, max_x),
            y1: self.y1.clamp(0, max_y),
            x2: self.x2.clamp(0, max_x),
            y2: self.y2.clamp(0, max_y),
        }
    }
}

impl From<[i32; 4]> for Roi {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<Roi> for [i32; 4] {
    fn from(r: Roi) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

impl std::fmt::Display for Roi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_inclusive() {
        let roi = Roi::new(150, 80, 500, 450);
        assert!(roi.contains(150.0, 80.0));
        assert!(roi.contains(500.0, 450.0));
        assert!(!roi.contains(500.5, 200.0));
        assert!(roi.contains_bbox(&BBox::new(210.0, 150.0, 260.0, 380.0)));
        assert!(!roi.contains_bbox(&BBox::new(100.0, 150.0, 260.0, 380.0)));
    }

    #[test]
    fn test_clamp() {
        let roi = Roi::new(-20, 10, 900, 700).clamp_to(640, 480);
        assert_eq!(roi, Roi::new(0, 10, 639, 479));
    }

    #[test]
    fn test_json_array_form() {
        let json = serde_json::to_string(&DEFAULT_PARKING_ROI).unwrap();
        assert_eq!(json, "[50,200,1200,700]");
        let back: Roi = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DEFAULT_PARKING_ROI);
    }
}
