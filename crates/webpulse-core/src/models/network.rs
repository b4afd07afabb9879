//! 네트워크 등급 모델.
//!
//! 호스트가 보고하는 유효 연결 타입(effective type)을 분류한다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 네트워크 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkClass {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "4g")]
    FourG,
    #[serde(rename = "ethernet")]
    Ethernet,
    #[serde(rename = "unknown")]
    Unknown,
}

impl NetworkClass {
    /// 호스트 문자열 파싱. 알 수 없는 값은 Unknown.
    pub fn parse(effective_type: &str) -> Self {
        match effective_type.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => NetworkClass::Slow2g,
            "2g" => NetworkClass::TwoG,
            "3g" => NetworkClass::ThreeG,
            "4g" => NetworkClass::FourG,
            "ethernet" => NetworkClass::Ethernet,
            _ => NetworkClass::Unknown,
        }
    }

    /// 빠른 네트워크 여부 (예측 프리로드 허용 조건)
    pub fn is_fast(&self) -> bool {
        matches!(self, NetworkClass::FourG | NetworkClass::Ethernet)
    }
}

impl fmt::Display for NetworkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetworkClass::Slow2g => "slow-2g",
            NetworkClass::TwoG => "2g",
            NetworkClass::ThreeG => "3g",
            NetworkClass::FourG => "4g",
            NetworkClass::Ethernet => "ethernet",
            NetworkClass::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// 호스트 연결 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// 유효 연결 타입 ("4g", "3g", ...)
    pub effective_type: String,
    /// 추정 다운링크 (Mbps)
    #[serde(default)]
    pub downlink: Option<f64>,
    /// 추정 RTT (ms)
    #[serde(default)]
    pub rtt: Option<u32>,
    /// 데이터 절약 모드
    #[serde(default)]
    pub save_data: bool,
}

impl ConnectionInfo {
    pub fn new(effective_type: impl Into<String>) -> Self {
        Self {
            effective_type: effective_type.into(),
            downlink: None,
            rtt: None,
            save_data: false,
        }
    }

    pub fn class(&self) -> NetworkClass {
        NetworkClass::parse(&self.effective_type)
    }
}
