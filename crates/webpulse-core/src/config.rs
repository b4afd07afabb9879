//! 애플리케이션 설정 구조체.
//!
//! 텔레메트리 엔드포인트/샘플링/배치, 관측 유예 시간, 프리로드 동시성과 라우트 인접 테이블,
//! 캐시 워커 등록 설정을 정의한다. JSON 키는 생성자 옵션 이름(camelCase)을 따른다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;
use crate::models::preload::{PreloadKind, PreloadPriority, PreloadTask};

/// 최상위 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 텔레메트리 수집/전송 설정
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// 성능 관측 설정
    #[serde(default)]
    pub observer: ObserverConfig,
    /// 리소스 프리로드 설정
    #[serde(default)]
    pub preload: PreloadConfig,
    /// 캐시 워커 설정
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 전체 설정 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        self.telemetry.validate()?;
        self.preload.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

// ============================================================
// 텔레메트리 설정
// ============================================================

/// 텔레메트리 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryConfig {
    /// 수집 엔드포인트 URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// 세션 샘플링 비율 (0.0 ~ 1.0)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// 배치 최대 크기. 도달 시 즉시 flush
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// 주기적 flush 간격 (밀리초)
    #[serde(default = "default_flush_interval_ms", rename = "flushInterval")]
    pub flush_interval_ms: u64,
    /// 전역 에러 추적
    #[serde(default = "default_true")]
    pub enable_error_tracking: bool,
    /// 사용자 타이밍(measure) 수집
    #[serde(default = "default_true")]
    pub enable_user_timings: bool,
    /// 리소스 타이밍 수집
    #[serde(default = "default_true")]
    pub enable_resource_timings: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            sample_rate: default_sample_rate(),
            max_batch_size: default_max_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            enable_error_tracking: true,
            enable_user_timings: true,
            enable_resource_timings: true,
        }
    }
}

impl TelemetryConfig {
    /// flush 간격
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(CoreError::validation(
                "telemetry.sampleRate",
                format!("0..=1 범위여야 합니다 (입력: {})", self.sample_rate),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(CoreError::validation(
                "telemetry.maxBatchSize",
                "1 이상이어야 합니다",
            ));
        }
        if self.flush_interval_ms == 0 {
            return Err(CoreError::validation(
                "telemetry.flushInterval",
                "1ms 이상이어야 합니다",
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(CoreError::validation(
                "telemetry.endpoint",
                "비어 있을 수 없습니다",
            ));
        }
        Ok(())
    }
}

fn default_endpoint() -> String {
    "/api/analytics/rum".to_string()
}

fn default_sample_rate() -> f64 {
    0.1
}

fn default_max_batch_size() -> usize {
    50
}

fn default_flush_interval_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

// ============================================================
// 관측 설정
// ============================================================

/// 성능 관측 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverConfig {
    /// 페이지 로드 후 관측 중단까지의 유예 시간 (밀리초)
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            stop_grace_ms: default_stop_grace_ms(),
        }
    }
}

impl ObserverConfig {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

fn default_stop_grace_ms() -> u64 {
    10_000
}

// ============================================================
// 프리로드 설정
// ============================================================

/// 라우트 하나의 프리로드 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    /// 라우트 경로 ("/services")
    pub path: String,
    /// 라우트 번들 URL
    pub bundle: String,
    /// 라우트 핵심 자산
    #[serde(default)]
    pub critical_assets: Vec<PreloadTask>,
    /// 가능성 높은 다음 라우트 (높은 순)
    #[serde(default)]
    pub next: Vec<String>,
}

/// 리소스 프리로드 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadConfig {
    /// 동시 진행 프리로드 상한 (연결 등급에 따라 재조정됨)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// 뷰포트 진입 판정 선행 여백 (px)
    #[serde(default = "default_viewport_margin_px")]
    pub viewport_margin_px: u32,
    /// hover 후 핵심 자산 프리로드 지연 (밀리초)
    #[serde(default = "default_hover_asset_delay_ms")]
    pub hover_asset_delay_ms: u64,
    /// 예측 프리로드할 다음 라우트 수
    #[serde(default = "default_predictive_limit")]
    pub predictive_limit: usize,
    /// 라우트 인접 테이블
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteEntry>,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            viewport_margin_px: default_viewport_margin_px(),
            hover_asset_delay_ms: default_hover_asset_delay_ms(),
            predictive_limit: default_predictive_limit(),
            routes: default_routes(),
        }
    }
}

impl PreloadConfig {
    pub fn hover_asset_delay(&self) -> Duration {
        Duration::from_millis(self.hover_asset_delay_ms)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_concurrent == 0 {
            return Err(CoreError::validation(
                "preload.maxConcurrent",
                "1 이상이어야 합니다",
            ));
        }
        if let Some(route) = self.routes.iter().find(|r| !r.path.starts_with('/')) {
            return Err(CoreError::validation(
                "preload.routes",
                format!("라우트 경로는 '/'로 시작해야 합니다: {}", route.path),
            ));
        }
        Ok(())
    }
}

fn default_max_concurrent() -> usize {
    3
}

fn default_viewport_margin_px() -> u32 {
    50
}

fn default_hover_asset_delay_ms() -> u64 {
    100
}

fn default_predictive_limit() -> usize {
    2
}

fn route(path: &str, chunk: &str, hero: Option<&str>, next: &[&str]) -> RouteEntry {
    RouteEntry {
        path: path.to_string(),
        bundle: format!("/static/js/{chunk}.chunk.js"),
        critical_assets: hero
            .map(|img| {
                vec![PreloadTask::new(
                    img,
                    PreloadKind::Image,
                    PreloadPriority::Medium,
                )]
            })
            .unwrap_or_default(),
        next: next.iter().map(|s| s.to_string()).collect(),
    }
}

/// 사이트 기본 라우트 인접 테이블
fn default_routes() -> Vec<RouteEntry> {
    vec![
        route(
            "/",
            "home",
            Some("/images/hero-home.webp"),
            &["/services", "/success-stories"],
        ),
        route(
            "/services",
            "services",
            Some("/images/hero-services.webp"),
            &["/contact", "/success-stories"],
        ),
        route("/blog", "blog", None, &["/blog/post", "/services"]),
        route("/blog/post", "blog-post", None, &["/blog", "/contact"]),
        route(
            "/careers",
            "careers",
            Some("/images/hero-careers.webp"),
            &["/contact", "/"],
        ),
        route(
            "/creative-house",
            "creative-house",
            Some("/images/portfolio-creative.webp"),
            &["/marketing-house", "/contact"],
        ),
        route(
            "/marketing-house",
            "marketing-house",
            Some("/images/portfolio-marketing.webp"),
            &["/creative-house", "/contact"],
        ),
        route(
            "/success-stories",
            "success-stories",
            None,
            &["/services", "/contact"],
        ),
        route("/contact", "contact", None, &["/"]),
    ]
}

// ============================================================
// 캐시 워커 설정
// ============================================================

/// 캐시 워커 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// 워커 스크립트 URL
    #[serde(default = "default_worker_url")]
    pub worker_url: String,
    /// 등록 범위
    #[serde(default = "default_scope")]
    pub scope: String,
    /// 업데이트 확인 주기 (밀리초)
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// 온라인 복귀 시 요청할 백그라운드 동기화 태그
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            worker_url: default_worker_url(),
            scope: default_scope(),
            update_interval_ms: default_update_interval_ms(),
            sync_tag: default_sync_tag(),
        }
    }
}

impl CacheConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.update_interval_ms == 0 {
            return Err(CoreError::validation(
                "cache.updateIntervalMs",
                "1ms 이상이어야 합니다",
            ));
        }
        Ok(())
    }
}

fn default_worker_url() -> String {
    "/sw.js".to_string()
}

fn default_scope() -> String {
    "/".to_string()
}

fn default_update_interval_ms() -> u64 {
    60_000
}

fn default_sync_tag() -> String {
    "background-sync".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default_config();
        assert_eq!(config.telemetry.sample_rate, 0.1);
        assert_eq!(config.telemetry.max_batch_size, 50);
        assert_eq!(config.telemetry.flush_interval(), Duration::from_secs(30));
        assert!(config.telemetry.enable_error_tracking);
        assert_eq!(config.preload.max_concurrent, 3);
        assert_eq!(config.cache.update_interval(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn camel_case_option_names_deserialize() {
        let json = r#"{
            "telemetry": {
                "endpoint": "https://rum.example.com/collect",
                "sampleRate": 1.0,
                "maxBatchSize": 5,
                "flushInterval": 1000,
                "enableResourceTimings": false
            },
            "preload": { "maxConcurrent": 2 }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.telemetry.endpoint, "https://rum.example.com/collect");
        assert_eq!(config.telemetry.max_batch_size, 5);
        assert_eq!(config.telemetry.flush_interval_ms, 1_000);
        assert!(!config.telemetry.enable_resource_timings);
        assert!(config.telemetry.enable_user_timings);
        assert_eq!(config.preload.max_concurrent, 2);
        assert!(!config.preload.routes.is_empty());
    }

    #[test]
    fn sample_rate_out_of_range_is_rejected() {
        let mut config = AppConfig::default_config();
        config.telemetry.sample_rate = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "telemetry.sampleRate"));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut config = AppConfig::default_config();
        config.telemetry.max_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_route_table_is_connected() {
        let routes = PreloadConfig::default().routes;
        for route in &routes {
            for next in &route.next {
                assert!(
                    routes.iter().any(|r| &r.path == next),
                    "{} -> {next} 누락",
                    route.path
                );
            }
        }
    }
}
