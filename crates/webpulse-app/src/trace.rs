//! 기록된 트레이스 포맷.
//!
//! ```json
//! {
//!   "supports": ["largest-contentful-paint", "longtask"],
//!   "device": { "userAgent": "...", "url": "https://example.com/" },
//!   "steps": [
//!     { "atMs": 120, "entry": { "entryType": "longtask", "startTime": 100, "duration": 80 } },
//!     { "atMs": 900, "event": { "event": "page-unload" } }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use webpulse_core::models::entry::{ObservationCategory, PerformanceEntry};
use webpulse_core::models::host_event::HostEvent;
use webpulse_core::models::session::DeviceInfo;

/// 기기 정보가 없는 트레이스의 기본 페이지 URL
const FALLBACK_PAGE_URL: &str = "http://localhost/";

/// 리플레이 트레이스
#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    /// 호스트가 지원한다고 보고할 관측 카테고리
    #[serde(default = "all_categories")]
    pub supports: Vec<ObservationCategory>,
    #[serde(default)]
    pub device: Option<DeviceInfo>,
    #[serde(default)]
    pub steps: Vec<TraceStep>,
}

fn all_categories() -> Vec<ObservationCategory> {
    ObservationCategory::ALL.to_vec()
}

/// 트레이스의 한 단계
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TraceStep {
    Entry {
        #[serde(rename = "atMs")]
        at_ms: u64,
        entry: PerformanceEntry,
    },
    Event {
        #[serde(rename = "atMs")]
        at_ms: u64,
        event: HostEvent,
    },
}

impl TraceStep {
    /// 트레이스 시작 기준 실행 시각 (ms)
    pub fn at_ms(&self) -> u64 {
        match self {
            TraceStep::Entry { at_ms, .. } | TraceStep::Event { at_ms, .. } => *at_ms,
        }
    }
}

impl Trace {
    /// JSON 문자열에서 파싱. 단계는 시각 순으로 정렬된다.
    pub fn parse(json: &str) -> Result<Self> {
        let mut trace: Trace = serde_json::from_str(json).context("트레이스 파싱 실패")?;
        trace.steps.sort_by_key(TraceStep::at_ms);
        Ok(trace)
    }

    /// 파일에서 로드
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("트레이스 파일 읽기 실패: {}", path.display()))?;
        Self::parse(&json).with_context(|| format!("트레이스 파일: {}", path.display()))
    }

    /// 리플레이에 사용할 기기 정보
    ///
    /// 트레이스에 기기 정보가 없으면 `origin`(없으면 localhost)을 페이지 URL로 쓴다.
    pub fn device_or(&self, origin: Option<&str>) -> DeviceInfo {
        self.device.clone().unwrap_or_else(|| DeviceInfo {
            user_agent: concat!("webpulse-replay/", env!("CARGO_PKG_VERSION")).to_string(),
            url: origin.unwrap_or(FALLBACK_PAGE_URL).to_string(),
            ..DeviceInfo::default()
        })
    }

    pub fn entry_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, TraceStep::Entry { .. }))
            .count()
    }
}
