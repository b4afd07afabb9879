//! 전역 에러 → 텔레메트리 봉투 변환.

use serde_json::{Map, Value};
use webpulse_core::models::envelope::Envelope;
use webpulse_core::models::host_event::HostEvent;

/// 에러 계열 호스트 이벤트를 `error` 봉투로 변환. 다른 이벤트는 None.
pub fn error_envelope(event: &HostEvent) -> Option<Envelope> {
    match event {
        HostEvent::UncaughtError {
            message,
            source,
            line,
            column,
            stack,
        } => {
            let mut data = Map::new();
            data.insert("kind".into(), Value::from("error"));
            if let Some(source) = source {
                data.insert("source".into(), Value::from(source.as_str()));
            }
            if let Some(line) = line {
                data.insert("line".into(), Value::from(*line));
            }
            if let Some(column) = column {
                data.insert("column".into(), Value::from(*column));
            }
            if let Some(stack) = stack {
                data.insert("stack".into(), Value::from(stack.as_str()));
            }
            Some(Envelope::error(message.as_str(), data))
        }
        HostEvent::UnhandledRejection { reason } => {
            let mut data = Map::new();
            data.insert("kind".into(), Value::from("unhandledrejection"));
            Some(Envelope::error(
                format!("Unhandled Promise Rejection: {reason}"),
                data,
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncaught_error_keeps_location() {
        let event = HostEvent::UncaughtError {
            message: "TypeError: x is undefined".into(),
            source: Some("/static/js/main.js".into()),
            line: Some(12),
            column: Some(7),
            stack: None,
        };

        match error_envelope(&event) {
            Some(Envelope::Error { message, data, .. }) => {
                assert_eq!(message, "TypeError: x is undefined");
                assert_eq!(data["line"], 12);
                assert_eq!(data["source"], "/static/js/main.js");
                assert!(data.get("stack").is_none());
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn rejection_is_prefixed() {
        let event = HostEvent::UnhandledRejection {
            reason: "timeout".into(),
        };
        match error_envelope(&event) {
            Some(Envelope::Error { message, .. }) => {
                assert_eq!(message, "Unhandled Promise Rejection: timeout")
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn other_events_are_ignored() {
        assert!(error_envelope(&HostEvent::PageUnload).is_none());
    }
}
