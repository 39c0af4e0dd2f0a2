// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 营业时间 / 深夜时段判断
//!
//! 时间窗口支持跨午夜 (start > end 时按 `t >= start || t <= end` 判断).

use chrono::{FixedOffset, Local, NaiveTime, TimeZone};
use tracing::warn;

use crate::config::ScheduleConfig;

/// 单帧的时段标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeOfDay {
    pub after_hours: bool,
    pub late_night: bool,
}

/// 营业时间表
#[derive(Debug, Clone)]
pub struct OperatingHours {
    config: ScheduleConfig,
}

impl OperatingHours {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    /// 时间戳 (Unix 秒) 转当地时刻
    pub fn local_time(&self, timestamp: f64) -> Option<NaiveTime> {
        if !timestamp.is_finite() {
            return None;
        }
        let secs = timestamp.floor();
        let nanos = (((timestamp - secs) * 1e9) as u32).min(999_999_999);
        let secs = secs as i64;

        match self.config.utc_offset_secs {
            Some(offset) => FixedOffset::east_opt(offset)?
                .timestamp_opt(secs, nanos)
                .single()
                .map(|dt| dt.time()),
            None => Local
                .timestamp_opt(secs, nanos)
                .earliest()
                .map(|dt| dt.time()),
        }
    }

    /// 营业时间外 (开门/关门时刻本身算营业时间内)
    pub fn is_after_hours(&self, t: NaiveTime) -> bool {
        !in_window(t, self.config.open, self.config.close)
    }

    /// 深夜 (默认 23:00 – 04:00, 含两端)
    pub fn is_late_night(&self, t: NaiveTime) -> bool {
        in_window(t, self.config.late_night_start, self.config.late_night_end)
    }

    /// 按帧时间戳分类
    pub fn classify(&self, timestamp: f64) -> TimeOfDay {
        match self.local_time(timestamp) {
            Some(t) => TimeOfDay {
                after_hours: self.is_after_hours(t),
                late_night: self.is_late_night(t),
            },
            None => {
                warn!(timestamp, "⚠️ 无法换算当地时间, 时段标记按白天处理");
                TimeOfDay::default()
            }
        }
    }
}

/// 闭区间时间窗口, 允许跨午夜
fn in_window(t: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end {
        start <= t && t <= end
    } else {
        t >= start || t <= end
    }
}
