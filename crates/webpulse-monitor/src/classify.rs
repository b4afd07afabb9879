//! 원시 엔트리 분류 규칙.

use serde::Serialize;
use webpulse_core::models::entry::{NavigationTiming, ResourceTiming};

/// 롱태스크 기준 (ms). 이 시간을 넘는 부분이 블로킹 시간이 된다.
pub const LONG_TASK_THRESHOLD_MS: f64 = 50.0;

/// 롱태스크 하나의 블로킹 시간 기여분
pub fn blocking_time(duration: f64) -> f64 {
    (duration - LONG_TASK_THRESHOLD_MS).max(0.0)
}

/// 내비게이션 단계별 소요 시간 (ms)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPhases {
    pub dns: f64,
    pub connection: f64,
    pub tls: f64,
    pub request: f64,
    pub response: f64,
    pub dom_parsing: f64,
    pub resource_loading: f64,
    pub total: f64,
}

fn span(start: f64, end: f64) -> f64 {
    (end - start).max(0.0)
}

impl NavigationPhases {
    pub fn from_timing(t: &NavigationTiming) -> Self {
        let tls = if t.secure_connection_start > 0.0 {
            span(t.secure_connection_start, t.connect_end)
        } else {
            0.0
        };
        Self {
            dns: span(t.domain_lookup_start, t.domain_lookup_end),
            connection: span(t.connect_start, t.connect_end),
            tls,
            request: span(t.request_start, t.response_start),
            response: span(t.response_start, t.response_end),
            dom_parsing: span(t.response_end, t.dom_interactive),
            resource_loading: span(t.dom_content_loaded_event_end, t.load_event_start),
            total: span(t.fetch_start, t.load_event_end),
        }
    }
}

/// TTFB = responseStart − requestStart
pub fn time_to_first_byte(t: &NavigationTiming) -> f64 {
    span(t.request_start, t.response_start)
}

/// 확장자 기반 리소스 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Image,
    Script,
    Stylesheet,
    Font,
    Other,
}

impl ResourceClass {
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let file = path.rsplit('/').next().unwrap_or(path);
        let Some((_, ext)) = file.rsplit_once('.') else {
            return ResourceClass::Other;
        };
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" => {
                ResourceClass::Image
            }
            "js" | "mjs" | "cjs" => ResourceClass::Script,
            "css" => ResourceClass::Stylesheet,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => ResourceClass::Font,
            _ => ResourceClass::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Image => "image",
            ResourceClass::Script => "script",
            ResourceClass::Stylesheet => "stylesheet",
            ResourceClass::Font => "font",
            ResourceClass::Other => "other",
        }
    }
}

/// 캐시에서 제공된 리소스인지 (전송 0바이트, 디코딩 본문 존재)
pub fn is_cached(r: &ResourceTiming) -> bool {
    r.transfer_size == 0 && r.decoded_body_size > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_time_ignores_sub_threshold() {
        assert_eq!(blocking_time(80.0), 30.0);
        assert_eq!(blocking_time(30.0), 0.0);
        assert_eq!(blocking_time(50.0), 0.0);
    }

    #[test]
    fn navigation_phases_decompose() {
        let timing = NavigationTiming {
            fetch_start: 0.0,
            domain_lookup_start: 5.0,
            domain_lookup_end: 25.0,
            connect_start: 25.0,
            connect_end: 85.0,
            secure_connection_start: 45.0,
            request_start: 90.0,
            response_start: 290.0,
            response_end: 340.0,
            dom_interactive: 900.0,
            dom_content_loaded_event_end: 950.0,
            load_event_start: 1_400.0,
            load_event_end: 1_420.0,
        };
        let phases = NavigationPhases::from_timing(&timing);

        assert_eq!(phases.dns, 20.0);
        assert_eq!(phases.connection, 60.0);
        assert_eq!(phases.tls, 40.0);
        assert_eq!(phases.request, 200.0);
        assert_eq!(phases.response, 50.0);
        assert_eq!(phases.dom_parsing, 560.0);
        assert_eq!(phases.resource_loading, 450.0);
        assert_eq!(phases.total, 1_420.0);
        assert_eq!(time_to_first_byte(&timing), 200.0);
    }

    #[test]
    fn plain_http_has_no_tls_phase() {
        let timing = NavigationTiming {
            connect_start: 10.0,
            connect_end: 30.0,
            ..NavigationTiming::default()
        };
        assert_eq!(NavigationPhases::from_timing(&timing).tls, 0.0);
    }

    #[test]
    fn resource_classification_by_extension() {
        assert_eq!(
            ResourceClass::from_url("https://cdn.example.com/a/hero.WEBP?w=640"),
            ResourceClass::Image
        );
        assert_eq!(
            ResourceClass::from_url("/static/js/main.3f2a.js"),
            ResourceClass::Script
        );
        assert_eq!(ResourceClass::from_url("/static/css/main.css#x"), ResourceClass::Stylesheet);
        assert_eq!(ResourceClass::from_url("/fonts/inter.woff2"), ResourceClass::Font);
        assert_eq!(ResourceClass::from_url("/api/services"), ResourceClass::Other);
        assert_eq!(ResourceClass::from_url("https://example.com/v1.2/data"), ResourceClass::Other);
    }

    #[test]
    fn cached_flag_requires_zero_transfer_and_body() {
        let mut r = ResourceTiming {
            transfer_size: 0,
            decoded_body_size: 2_048,
            ..ResourceTiming::default()
        };
        assert!(is_cached(&r));
        r.decoded_body_size = 0;
        assert!(!is_cached(&r));
        r.transfer_size = 300;
        r.decoded_body_size = 2_048;
        assert!(!is_cached(&r));
    }
}
