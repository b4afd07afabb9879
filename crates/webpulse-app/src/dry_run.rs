//! 전송하지 않고 페이로드를 로그로 남기는 텔레메트리 전송.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use webpulse_core::error::CoreError;
use webpulse_core::models::envelope::TelemetryPayload;
use webpulse_core::ports::transport::TelemetryTransport;

/// dry-run 전송
#[derive(Default)]
pub struct LoggingTransport {
    payloads: AtomicU64,
}

impl LoggingTransport {
    /// 로그로 남긴 페이로드 수
    pub fn payload_count(&self) -> u64 {
        self.payloads.load(Ordering::Relaxed)
    }

    fn log(
        &self,
        endpoint: &str,
        payload: &TelemetryPayload,
        beacon: bool,
    ) -> Result<(), CoreError> {
        let body = serde_json::to_string(payload)?;
        self.payloads.fetch_add(1, Ordering::Relaxed);
        info!(
            endpoint,
            beacon,
            envelopes = payload.batch.len(),
            "텔레메트리 (dry-run): {body}"
        );
        Ok(())
    }
}

#[async_trait]
impl TelemetryTransport for LoggingTransport {
    async fn send(&self, endpoint: &str, payload: &TelemetryPayload) -> Result<(), CoreError> {
        self.log(endpoint, payload, false)
    }

    fn send_beacon(&self, endpoint: &str, payload: &TelemetryPayload) -> bool {
        self.log(endpoint, payload, true).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use webpulse_core::models::envelope::Envelope;
    use webpulse_core::models::session::{DeviceInfo, Session};

    #[tokio::test]
    async fn every_payload_is_counted() {
        let session = Session {
            session_id: "session_1".into(),
            user_id: "user_1".into(),
            started_at: 0,
            device_info: DeviceInfo::default(),
        };
        let batch = vec![Envelope::custom_event("x", Map::new())];
        let payload = TelemetryPayload::new(batch, &session);
        let transport = LoggingTransport::default();

        transport.send("/api/analytics/rum", &payload).await.unwrap();
        assert!(transport.send_beacon("/api/analytics/rum", &payload));
        assert_eq!(transport.payload_count(), 2);
    }
}
