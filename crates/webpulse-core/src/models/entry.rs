//! 원시 성능 엔트리 모델.
//!
//! 호스트의 성능 관측 기본 요소가 전달하는 엔트리를 플랫폼 독립적으로 표현한다.
//! 모든 시각은 페이지 기준 상대 시각(ms)이다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 관측 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationCategory {
    LargestContentfulPaint,
    FirstInput,
    LayoutShift,
    #[serde(rename = "longtask")]
    LongTask,
    Navigation,
    Resource,
    /// 사용자 타이밍 (performance.measure)
    Measure,
}

impl ObservationCategory {
    /// 전체 카테고리
    pub const ALL: [ObservationCategory; 7] = [
        ObservationCategory::LargestContentfulPaint,
        ObservationCategory::FirstInput,
        ObservationCategory::LayoutShift,
        ObservationCategory::LongTask,
        ObservationCategory::Navigation,
        ObservationCategory::Resource,
        ObservationCategory::Measure,
    ];

    /// 호스트 엔트리 타입 문자열
    pub fn entry_type(&self) -> &'static str {
        match self {
            ObservationCategory::LargestContentfulPaint => "largest-contentful-paint",
            ObservationCategory::FirstInput => "first-input",
            ObservationCategory::LayoutShift => "layout-shift",
            ObservationCategory::LongTask => "longtask",
            ObservationCategory::Navigation => "navigation",
            ObservationCategory::Resource => "resource",
            ObservationCategory::Measure => "measure",
        }
    }
}

impl fmt::Display for ObservationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry_type())
    }
}

/// 내비게이션 타이밍
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationTiming {
    pub fetch_start: f64,
    pub domain_lookup_start: f64,
    pub domain_lookup_end: f64,
    pub connect_start: f64,
    pub connect_end: f64,
    /// TLS 미사용 시 0
    pub secure_connection_start: f64,
    pub request_start: f64,
    pub response_start: f64,
    pub response_end: f64,
    pub dom_interactive: f64,
    pub dom_content_loaded_event_end: f64,
    pub load_event_start: f64,
    pub load_event_end: f64,
}

/// 리소스 타이밍
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceTiming {
    /// 리소스 URL
    pub name: String,
    pub initiator_type: String,
    pub start_time: f64,
    pub duration: f64,
    pub transfer_size: u64,
    pub decoded_body_size: u64,
}

/// 원시 성능 엔트리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entryType", rename_all = "kebab-case")]
pub enum PerformanceEntry {
    #[serde(rename_all = "camelCase")]
    LargestContentfulPaint {
        start_time: f64,
        #[serde(default)]
        size: Option<u64>,
        #[serde(default)]
        element: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    FirstInput {
        #[serde(default)]
        name: String,
        start_time: f64,
        processing_start: f64,
    },
    #[serde(rename_all = "camelCase")]
    LayoutShift {
        start_time: f64,
        value: f64,
        #[serde(default)]
        had_recent_input: bool,
    },
    #[serde(rename = "longtask", rename_all = "camelCase")]
    LongTask {
        start_time: f64,
        duration: f64,
        #[serde(default)]
        attribution: Option<String>,
    },
    Navigation(NavigationTiming),
    Resource(ResourceTiming),
    #[serde(rename_all = "camelCase")]
    Measure {
        name: String,
        start_time: f64,
        duration: f64,
    },
}

impl PerformanceEntry {
    /// 엔트리가 속한 관측 카테고리
    pub fn category(&self) -> ObservationCategory {
        match self {
            PerformanceEntry::LargestContentfulPaint { .. } => {
                ObservationCategory::LargestContentfulPaint
            }
            PerformanceEntry::FirstInput { .. } => ObservationCategory::FirstInput,
            PerformanceEntry::LayoutShift { .. } => ObservationCategory::LayoutShift,
            PerformanceEntry::LongTask { .. } => ObservationCategory::LongTask,
            PerformanceEntry::Navigation(_) => ObservationCategory::Navigation,
            PerformanceEntry::Resource(_) => ObservationCategory::Resource,
            PerformanceEntry::Measure { .. } => ObservationCategory::Measure,
        }
    }
}
