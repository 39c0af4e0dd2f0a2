/// 行为分析数据结构定义
/// Data structures for the behavioral heuristics pipeline
use serde::{Deserialize, Serialize};

// ========== 数据结构 ==========

/// 检测框 (像素坐标, 左上角 x1/y1, 右下角 x2/y2)
///
/// JSON 中写作 `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// 中心点
    pub fn center(&self) -> (f32, f32) {
        super::geometry::bbox_center(self)
    }
}

impl From<[f32; 4]> for BBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// 外部检测器的单帧输出 (一帧一个目标一条)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    #[serde(alias = "conf")]
    pub confidence: f32,
    pub class_name: String,
}

impl Detection {
    pub fn new(bbox: BBox, confidence: f32, class_name: impl Into<String>) -> Self {
        Self {
            bbox,
            confidence,
            class_name: class_name.into(),
        }
    }

    pub fn class(&self) -> Option<ObjectClass> {
        ObjectClass::from_name(&self.class_name)
    }

    /// 是否参与跟踪 (人 / 车辆)
    pub fn is_trackable(&self) -> bool {
        self.class().is_some()
    }
}

// ========== 枚举类型 ==========

/// 行为分析关心的目标类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Person,
    Car,
    Truck,
    Bus,
    Motorbike,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 5] = [
        ObjectClass::Person,
        ObjectClass::Car,
        ObjectClass::Truck,
        ObjectClass::Bus,
        ObjectClass::Motorbike,
    ];

    /// 按检测器标签识别类别, 非跟踪类别返回 None
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "person" => Some(Self::Person),
            "car" => Some(Self::Car),
            "truck" => Some(Self::Truck),
            "bus" => Some(Self::Bus),
            // COCO 标签写作 motorcycle
            "motorbike" | "motorcycle" => Some(Self::Motorbike),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Car => "car",
            Self::Truck => "truck",
            Self::Bus => "bus",
            Self::Motorbike => "motorbike",
        }
    }

    pub fn is_vehicle(&self) -> bool {
        !matches!(self, Self::Person)
    }
}
