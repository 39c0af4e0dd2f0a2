//! ATM 交互区自动识别
//! Infers the ATM interaction zone from a single frame
//!
//! 灰度 → 高斯模糊 → Canny → 外轮廓 → 外接矩形过滤 → 站立区扩展.
//! 没有合格候选时使用画面左侧中部的固定矩形, 同样做扩展.

use image::{DynamicImage, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use super::Roi;
use crate::config::RoiDetectorConfig;
use crate::detection::{ObjectClass, Track};
use crate::error::RoiError;

// 无候选时的固定矩形 (图像宽高比例)
const FALLBACK_X1: f64 = 0.05;
const FALLBACK_Y1: f64 = 0.10;
const FALLBACK_X2: f64 = 0.45;
const FALLBACK_Y2: f64 = 0.90;

/// ATM 区域识别器
#[derive(Clone, Debug, Default)]
pub struct RoiDetector {
    config: RoiDetectorConfig,
}

impl RoiDetector {
    pub fn new(config: RoiDetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RoiDetectorConfig {
        &self.config
    }

    /// 从一帧图像推断 ATM 交互区 (纯函数, 同一帧结果相同)
    pub fn detect(&self, frame: &DynamicImage) -> Result<Roi, RoiError> {
        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return Err(RoiError::EmptyFrame { width, height });
        }

        let gray = frame.to_luma8();
        let candidates = self.candidate_rects(&gray);
        let fixture = self
            .select_candidate(&candidates, width, height)
            .unwrap_or_else(|| {
                debug!(candidates = candidates.len(), "无合格轮廓, 使用默认矩形");
                fallback_fixture(width, height)
            });

        Ok(self.expand_to_standing_zone(&fixture, width, height))
    }

    /// 外轮廓的外接矩形 (右/下边界为开区间, 与 x + w 一致)
    pub fn candidate_rects(&self, gray: &GrayImage) -> Vec<Roi> {
        let blurred = gaussian_blur_f32(gray, self.config.blur_sigma);
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);

        find_contours::<i32>(&edges)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter_map(|c| {
                let min_x = c.points.iter().map(|p| p.x).min()?;
                let max_x = c.points.iter().map(|p| p.x).max()?;
                let min_y = c.points.iter().map(|p| p.y).min()?;
                let max_y = c.points.iter().map(|p| p.y).max()?;
                Some(Roi::new(min_x, min_y, max_x + 1, max_y + 1))
            })
            .collect()
    }

    /// 按面积 / 位置 / 边缘距离 / 宽高比过滤, 保留面积最大的候选
    ///
    /// 面积相同时保留先出现的.
    pub fn select_candidate(&self, rects: &[Roi], width: u32, height: u32) -> Option<Roi> {
        let cfg = &self.config;
        let (w, h) = (width as f64, height as f64);
        let image_area = w * h;
        let margin = cfg.border_margin_px as i64;

        let mut best: Option<Roi> = None;
        let mut best_area = 0i64;

        for rect in rects {
            let (cw, ch) = (rect.width() as i64, rect.height() as i64);
            if cw <= 0 || ch <= 0 {
                continue;
            }
            let area = cw * ch;
            if (area as f64) < cfg.min_area_frac * image_area
                || (area as f64) > cfg.max_area_frac * image_area
            {
                continue;
            }
            // ATM 假定在画面左侧
            let cx = rect.x1 as f64 + cw as f64 / 2.0;
            if cx > cfg.max_center_x_frac * w {
                continue;
            }
            // 贴边的轮廓多为伪影
            let (x1, y1, x2, y2) = (
                rect.x1 as i64,
                rect.y1 as i64,
                rect.x2 as i64,
                rect.y2 as i64,
            );
            if x1 < margin
                || y1 < margin
                || x2 > width as i64 - margin
                || y2 > height as i64 - margin
            {
                continue;
            }
            let aspect = cw as f64 / ch as f64;
            if aspect < cfg.min_aspect || aspect > cfg.max_aspect {
                continue;
            }
            if area > best_area {
                best_area = area;
                best = Some(*rect);
            }
        }

        best
    }

    /// 向左右 / 上 / 下扩展到用户站立的区域, 再截断到图像范围
    pub fn expand_to_standing_zone(&self, fixture: &Roi, width: u32, height: u32) -> Roi {
        let cfg = &self.config;
        let bw = fixture.width() as f64;
        let bh = fixture.height() as f64;
        let pad_x = cfg.pad_x_frac * bw;
        let pad_top = cfg.pad_top_frac * bh;
        let pad_bottom = cfg.pad_bottom_frac * bh;

        let max_x = width.saturating_sub(1) as i32;
        let max_y = height.saturating_sub(1) as i32;

        Roi::new(
            ((fixture.x1 as f64 - pad_x) as i32).max(0),
            ((fixture.y1 as f64 - pad_top) as i32).max(0),
            ((fixture.x2 as f64 + pad_x) as i32).min(max_x),
            ((fixture.y2 as f64 + pad_bottom) as i32).min(max_y),
        )
    }
}

/// 使用默认参数识别
pub fn auto_detect_atm_roi(frame: &DynamicImage) -> Result<Roi, RoiError> {
    RoiDetector::default().detect(frame)
}

/// 画面左侧中部的固定矩形 (扩展前)
fn fallback_fixture(width: u32, height: u32) -> Roi {
    let (w, h) = (width as f64, height as f64);
    Roi::new(
        (FALLBACK_X1 * w) as i32,
        (FALLBACK_Y1 * h) as i32,
        (FALLBACK_X2 * w) as i32,
        (FALLBACK_Y2 * h) as i32,
    )
}

/// 按当前所有人员轨迹重新推导 ATM 区域
///
/// 取人员框的并集, 左右各扩展 `people_pad_x_frac * 宽`, 上下各扩展
/// `people_pad_y_frac * 高`. 没有人员或图像为空时返回 None.
pub fn fallback_roi_from_people(
    tracks: &[Track],
    width: u32,
    height: u32,
    config: &RoiDetectorConfig,
) -> Option<Roi> {
    if width == 0 || height == 0 {
        return None;
    }

    let mut people = tracks
        .iter()
        .filter(|t| ObjectClass::from_name(&t.class_name) == Some(ObjectClass::Person))
        .map(|t| &t.bbox)
        .peekable();
    people.peek()?;

    // 在 f64 中计算并截断到图像范围, 异常坐标不会溢出
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for b in people {
        min_x = min_x.min((b.x1 as f64).trunc());
        min_y = min_y.min((b.y1 as f64).trunc());
        max_x = max_x.max((b.x2 as f64).trunc());
        max_y = max_y.max((b.y2 as f64).trunc());
    }

    let pad_x = (config.people_pad_x_frac * width as f64).trunc();
    let pad_y = (config.people_pad_y_frac * height as f64).trunc();
    let last_x = (width - 1) as f64;
    let last_y = (height - 1) as f64;
    let clamp = |v: f64, last: f64| v.max(0.0).min(last) as i32;

    Some(Roi::new(
        clamp(min_x - pad_x, last_x),
        clamp(min_y - pad_y, last_y),
        clamp(max_x + pad_x, last_x),
        clamp(max_y + pad_y, last_y),
    ))
}
