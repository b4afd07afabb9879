//! 성능 지표 모델.
//!
//! 브라우저 성능 신호를 분류한 결과(`Metric`)와 품질 등급 임계값을 정의한다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 품질 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    /// 양호
    Good,
    /// 개선 필요
    NeedsImprovement,
    /// 불량
    Poor,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Good => write!(f, "good"),
            Rating::NeedsImprovement => write!(f, "needs-improvement"),
            Rating::Poor => write!(f, "poor"),
        }
    }
}

/// 등급 임계값 (상한 포함)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// 이 값 이하이면 Good
    pub good: f64,
    /// 이 값 이하이면 NeedsImprovement, 초과하면 Poor
    pub needs_improvement: f64,
}

impl Thresholds {
    pub const fn new(good: f64, needs_improvement: f64) -> Self {
        Self {
            good,
            needs_improvement,
        }
    }

    /// 값에 대한 등급 계산
    pub fn rate(&self, value: f64) -> Rating {
        if value <= self.good {
            Rating::Good
        } else if value <= self.needs_improvement {
            Rating::NeedsImprovement
        } else {
            Rating::Poor
        }
    }
}

/// LCP 임계값 (ms)
pub const LCP_THRESHOLDS: Thresholds = Thresholds::new(2_500.0, 4_000.0);
/// FID 임계값 (ms)
pub const FID_THRESHOLDS: Thresholds = Thresholds::new(100.0, 300.0);
/// CLS 임계값 (무단위)
pub const CLS_THRESHOLDS: Thresholds = Thresholds::new(0.1, 0.25);
/// TTFB 임계값 (ms)
pub const TTFB_THRESHOLDS: Thresholds = Thresholds::new(800.0, 1_800.0);

/// 지표 이름
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricName {
    #[serde(rename = "LCP")]
    Lcp,
    #[serde(rename = "FID")]
    Fid,
    #[serde(rename = "CLS")]
    Cls,
    #[serde(rename = "TTFB")]
    Ttfb,
    #[serde(rename = "navigation")]
    Navigation,
    #[serde(rename = "resource")]
    Resource,
    #[serde(rename = "long-task")]
    LongTask,
    /// 사용자 정의 측정 (performance.measure)
    #[serde(untagged)]
    Custom(String),
}

impl MetricName {
    /// 와이어 포맷 이름
    pub fn as_str(&self) -> &str {
        match self {
            MetricName::Lcp => "LCP",
            MetricName::Fid => "FID",
            MetricName::Cls => "CLS",
            MetricName::Ttfb => "TTFB",
            MetricName::Navigation => "navigation",
            MetricName::Resource => "resource",
            MetricName::LongTask => "long-task",
            MetricName::Custom(name) => name,
        }
    }

    /// 고유 임계값이 정의된 지표의 임계값
    pub fn thresholds(&self) -> Option<Thresholds> {
        match self {
            MetricName::Lcp => Some(LCP_THRESHOLDS),
            MetricName::Fid => Some(FID_THRESHOLDS),
            MetricName::Cls => Some(CLS_THRESHOLDS),
            MetricName::Ttfb => Some(TTFB_THRESHOLDS),
            _ => None,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 분류된 단일 관측값. 생성 후 변경되지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// 지표 이름
    pub name: MetricName,
    /// 측정값
    pub value: f64,
    /// 품질 등급 (임계값이 없는 지표는 None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    /// 부가 속성
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// 생성 시각 (Unix epoch ms)
    pub timestamp: i64,
}

impl Metric {
    /// 임계값에 따라 등급을 붙여 지표 생성
    pub fn rated(name: MetricName, value: f64) -> Self {
        let rating = name.thresholds().map(|t| t.rate(value));
        Self {
            name,
            value,
            rating,
            attributes: Map::new(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// 속성 추가 (빌더)
    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}
