//! 텔레메트리 봉투(envelope)와 전송 페이로드.
//!
//! 배치에 쌓이는 이질적 항목과 서버로 POST되는 JSON 와이어 포맷을 정의한다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::metric::{Metric, Rating};
use crate::models::session::Session;

/// 배치 항목
///
/// 와이어 포맷: `{ "type": "metric" | "error" | "interaction" | "customEvent", ..., "timestamp" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Envelope {
    /// 분류된 성능 지표
    Metric {
        name: String,
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rating: Option<Rating>,
        #[serde(default)]
        data: Map<String, Value>,
        timestamp: i64,
    },
    /// 전역 에러 / 처리되지 않은 Promise 거부
    Error {
        message: String,
        #[serde(default)]
        data: Map<String, Value>,
        timestamp: i64,
    },
    /// 사용자 상호작용 / 참여 추적
    Interaction {
        name: String,
        #[serde(default)]
        data: Map<String, Value>,
        timestamp: i64,
    },
    /// 애플리케이션 정의 이벤트
    CustomEvent {
        name: String,
        #[serde(default)]
        data: Map<String, Value>,
        timestamp: i64,
    },
}

impl Envelope {
    /// 항목 종류 문자열
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Metric { .. } => "metric",
            Envelope::Error { .. } => "error",
            Envelope::Interaction { .. } => "interaction",
            Envelope::CustomEvent { .. } => "customEvent",
        }
    }

    /// 항목 생성 시각
    pub fn timestamp(&self) -> i64 {
        match self {
            Envelope::Metric { timestamp, .. }
            | Envelope::Error { timestamp, .. }
            | Envelope::Interaction { timestamp, .. }
            | Envelope::CustomEvent { timestamp, .. } => *timestamp,
        }
    }

    /// 에러 항목 생성
    pub fn error(message: impl Into<String>, data: Map<String, Value>) -> Self {
        Envelope::Error {
            message: message.into(),
            data,
            timestamp: now_millis(),
        }
    }

    /// 상호작용 항목 생성
    pub fn interaction(name: impl Into<String>, data: Map<String, Value>) -> Self {
        Envelope::Interaction {
            name: name.into(),
            data,
            timestamp: now_millis(),
        }
    }

    /// 사용자 정의 이벤트 항목 생성
    pub fn custom_event(name: impl Into<String>, data: Map<String, Value>) -> Self {
        Envelope::CustomEvent {
            name: name.into(),
            data,
            timestamp: now_millis(),
        }
    }
}

impl From<&Metric> for Envelope {
    fn from(metric: &Metric) -> Self {
        Envelope::Metric {
            name: metric.name.as_str().to_string(),
            value: metric.value,
            rating: metric.rating,
            data: metric.attributes.clone(),
            timestamp: metric.timestamp,
        }
    }
}

/// 서버로 전송되는 단일 페이로드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    /// 삽입 순서(FIFO) 그대로의 배치
    pub batch: Vec<Envelope>,
    pub session_id: String,
    pub user_id: String,
    /// 페이로드 생성 시각 (Unix epoch ms)
    pub timestamp: i64,
    pub user_agent: String,
    pub url: String,
}

impl TelemetryPayload {
    /// 세션 메타데이터와 배치를 묶어 페이로드 생성
    pub fn new(batch: Vec<Envelope>, session: &Session) -> Self {
        Self {
            batch,
            session_id: session.session_id.clone(),
            user_id: session.user_id.clone(),
            timestamp: now_millis(),
            user_agent: session.device_info.user_agent.clone(),
            url: session.device_info.url.clone(),
        }
    }
}

/// 현재 시각 (Unix epoch ms)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metric::MetricName;
    use crate::models::session::DeviceInfo;

    #[test]
    fn envelope_type_tags_match_wire_format() {
        let metric = Metric::rated(MetricName::Cls, 0.3);
        let envelopes = vec![
            Envelope::from(&metric),
            Envelope::error("boom", Map::new()),
            Envelope::interaction("page_load", Map::new()),
            Envelope::custom_event("cta_click", Map::new()),
        ];

        for envelope in &envelopes {
            let json = serde_json::to_value(envelope).unwrap();
            assert_eq!(json["type"], envelope.kind());
            assert!(json["timestamp"].is_i64());
        }

        let json = serde_json::to_value(&envelopes[0]).unwrap();
        assert_eq!(json["name"], "CLS");
        assert_eq!(json["rating"], "poor");
    }

    #[test]
    fn payload_uses_camel_case_fields() {
        let session = Session {
            session_id: "s1".into(),
            user_id: "u1".into(),
            started_at: 0,
            device_info: DeviceInfo {
                user_agent: "test-agent".into(),
                url: "https://example.com/blog".into(),
                ..DeviceInfo::default()
            },
        };
        let payload = TelemetryPayload::new(vec![Envelope::error("x", Map::new())], &session);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["userAgent"], "test-agent");
        assert_eq!(json["url"], "https://example.com/blog");
        assert_eq!(json["batch"][0]["type"], "error");
    }
}
