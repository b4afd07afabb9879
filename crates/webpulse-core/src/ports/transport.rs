//! 텔레메트리 전송 포트.
//!
//! 구현: `webpulse-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::envelope::TelemetryPayload;

/// 텔레메트리 전송
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    /// 일반 비동기 전송
    async fn send(&self, endpoint: &str, payload: &TelemetryPayload) -> Result<(), CoreError>;

    /// 최선 노력(best-effort) 비차단 전송
    ///
    /// 페이지 해체 중에도 살아남아야 하며, 네트워크 왕복을 기다리지 않고 즉시 반환한다.
    /// 호스트가 전송을 수락했는지 여부만 반환한다.
    fn send_beacon(&self, endpoint: &str, payload: &TelemetryPayload) -> bool;
}
