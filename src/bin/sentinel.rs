//! 数字卫兵 - 检测日志回放
//!
//! 读取逐帧检测结果 (JSON Lines), 送入单路摄像头引擎, 把判定结果按行输出为 JSON.
//!
//! 输入每行格式:
//! `{"timestamp": 1704067200.0, "detections": [{"bbox": [x1, y1, x2, y2], "confidence": 0.9, "class_name": "person"}]}`

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentinel_heuristics::{CameraType, Detection, HeuristicConfig, HeuristicEngine, Verdict};

/// 回放参数
#[derive(Parser, Debug)]
#[command(author, version, about = "数字卫兵 - 检测日志回放", long_about = None)]
struct Args {
    /// 检测日志 (JSON Lines), "-" 表示标准输入
    #[arg(short, long)]
    detections: PathBuf,

    /// 摄像头类型: ATM / PARKING / 其它 (其它类型不做分析)
    #[arg(short, long, default_value = "ATM")]
    camera_type: String,

    /// 配置文件 (JSON), 不存在时写出默认配置
    #[arg(long)]
    config: Option<PathBuf>,

    /// 用于 ATM 区域识别的参考帧
    #[arg(short, long)]
    frame: Option<PathBuf>,

    /// 无参考帧时的空白帧宽度
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// 无参考帧时的空白帧高度
    #[arg(long, default_value_t = 720)]
    height: u32,
}

/// 日志中的一帧
#[derive(Debug, Deserialize)]
struct FrameRecord {
    timestamp: f64,
    #[serde(default)]
    detections: Vec<Detection>,
}

/// 输出的一行
#[derive(Debug, Serialize)]
struct VerdictRecord<'a> {
    timestamp: f64,
    #[serde(flatten)]
    verdict: &'a Verdict,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    // ========== 配置 ==========
    let config = match &args.config {
        Some(path) => HeuristicConfig::load(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => HeuristicConfig::default(),
    };

    let camera_type = CameraType::parse(&args.camera_type);
    let mut engine = HeuristicEngine::new(camera_type.clone(), config)?;

    // ========== 参考帧 ==========
    let frame = match &args.frame {
        Some(path) => image::open(path)
            .with_context(|| format!("无法读取参考帧: {}", path.display()))?,
        None => DynamicImage::new_rgb8(args.width, args.height),
    };

    info!("🚀 回放启动");
    info!("📹 摄像头类型: {}", camera_type);
    info!("🖼️ 参考帧: {}x{}", frame.width(), frame.height());

    // ========== 回放 ==========
    let reader: Box<dyn BufRead> = if args.detections.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&args.detections)
            .with_context(|| format!("无法打开检测日志: {}", args.detections.display()))?;
        Box::new(BufReader::new(file))
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let (mut frames, mut verdicts, mut high) = (0usize, 0usize, 0usize);
    let mut last_ts = f64::NEG_INFINITY;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("读取检测日志失败")?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(&line)
            .with_context(|| format!("第 {} 行格式错误", line_no + 1))?;

        if record.timestamp < last_ts {
            warn!(
                line = line_no + 1,
                timestamp = record.timestamp,
                "⚠️ 时间戳倒退, 驻留时间按 0 累计"
            );
        }
        last_ts = last_ts.max(record.timestamp);
        frames += 1;

        // 参考帧内容只在首帧用于 ATM 区域识别; 之后每帧仍按其宽高截断按人员推导的区域
        if let Some(verdict) = engine.process_frame(&frame, &record.detections, record.timestamp) {
            verdicts += 1;
            if !verdict.labels.is_empty() {
                high += 1;
            }
            let row = VerdictRecord {
                timestamp: record.timestamp,
                verdict: &verdict,
            };
            serde_json::to_writer(&mut out, &row)?;
            writeln!(out)?;
        }
    }

    if let Some(roi) = engine.atm_roi() {
        info!("🎯 ATM 区域: {}", roi);
    }
    info!(
        "✅ 回放完成: {} 帧, {} 条判定, {} 条告警",
        frames, verdicts, high
    );
    Ok(())
}
