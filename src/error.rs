//! 错误类型 (Error types)
//!
//! 只有构造阶段和注册表查询会返回错误, 逐帧路径内部自行降级处理.

use std::path::PathBuf;

use thiserror::Error;

/// 配置错误 (构造时立即失败)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// ROI 自动识别错误
#[derive(Debug, Error)]
pub enum RoiError {
    #[error("cannot detect ROI on an empty {width}x{height} frame")]
    EmptyFrame { width: u32, height: u32 },
}

/// 摄像头注册表错误
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("camera `{0}` is not registered")]
    UnknownCamera(String),

    #[error("camera `{0}` is already registered")]
    DuplicateCamera(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
