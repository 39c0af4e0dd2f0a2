//! 摄像头行为类型 (Camera behavior profile)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 摄像头行为类型
///
/// 只有 ATM 和 PARKING 会触发行为分析, 其它类型引擎不做任何处理.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CameraType {
    Atm,
    Parking,
    /// 未知类型 (保留原始名称, 已转大写)
    Other(String),
}

impl CameraType {
    /// 按配置字符串识别, 不区分大小写
    pub fn parse(profile: &str) -> Self {
        let upper = profile.trim().to_uppercase();
        match upper.as_str() {
            "ATM" => Self::Atm,
            "PARKING" => Self::Parking,
            "" => Self::Other("GENERIC".to_string()),
            _ => Self::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Atm => "ATM",
            Self::Parking => "PARKING",
            Self::Other(name) => name,
        }
    }

    /// 是否启用行为分析
    pub fn is_monitored(&self) -> bool {
        matches!(self, Self::Atm | Self::Parking)
    }
}

impl Default for CameraType {
    fn default() -> Self {
        Self::Other("GENERIC".to_string())
    }
}

impl FromStr for CameraType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for CameraType {
    fn from(profile: String) -> Self {
        Self::parse(&profile)
    }
}

impl From<CameraType> for String {
    fn from(camera_type: CameraType) -> Self {
        camera_type.as_str().to_string()
    }
}

impl fmt::Display for CameraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(CameraType::parse("atm"), CameraType::Atm);
        assert_eq!(CameraType::parse(" Parking "), CameraType::Parking);
        assert_eq!(
            CameraType::parse("lobby"),
            CameraType::Other("LOBBY".to_string())
        );
        assert_eq!(CameraType::parse("").as_str(), "GENERIC");
        assert!(!CameraType::default().is_monitored());
        assert!(CameraType::Atm.is_monitored());
    }
}
