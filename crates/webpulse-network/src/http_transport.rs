//! HTTP 텔레메트리 전송.
//!
//! `TelemetryTransport` 포트 구현. 재시도 없이 한 번만 POST한다.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use webpulse_core::error::CoreError;
use webpulse_core::models::envelope::TelemetryPayload;
use webpulse_core::ports::transport::TelemetryTransport;

/// 기본 요청 타임아웃
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest 기반 텔레메트리 전송
#[derive(Clone)]
pub struct HttpTelemetryTransport {
    client: reqwest::Client,
    /// 상대 경로 엔드포인트의 기준 URL
    base_url: Url,
}

impl HttpTelemetryTransport {
    /// 새 전송 생성
    ///
    /// `base_url`: 엔드포인트가 `/api/...` 같은 상대 경로일 때 기준이 되는 origin
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CoreError::Config(format!("잘못된 기준 URL '{base_url}': {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// 기본 타임아웃으로 생성
    pub fn with_default_timeout(base_url: &str) -> Result<Self, CoreError> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    /// 엔드포인트를 절대 URL로 변환
    fn resolve(&self, endpoint: &str) -> Result<Url, CoreError> {
        match Url::parse(endpoint) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .join(endpoint)
                .map_err(|e| CoreError::Config(format!("엔드포인트 해석 실패 '{endpoint}': {e}"))),
            Err(e) => Err(CoreError::Config(format!(
                "잘못된 엔드포인트 '{endpoint}': {e}"
            ))),
        }
    }
}

async fn post_payload(
    client: &reqwest::Client,
    url: Url,
    payload: &TelemetryPayload,
) -> Result<(), CoreError> {
    let resp = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| CoreError::Network(format!("텔레메트리 요청 실패: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(CoreError::Network(format!(
            "텔레메트리 수집 서버 응답 오류 ({status})"
        )));
    }
    Ok(())
}

#[async_trait]
impl TelemetryTransport for HttpTelemetryTransport {
    async fn send(&self, endpoint: &str, payload: &TelemetryPayload) -> Result<(), CoreError> {
        let url = self.resolve(endpoint)?;
        debug!("텔레메트리 전송: {url} ({}개 봉투)", payload.batch.len());
        post_payload(&self.client, url, payload).await
    }

    fn send_beacon(&self, endpoint: &str, payload: &TelemetryPayload) -> bool {
        let url = match self.resolve(endpoint) {
            Ok(url) => url,
            Err(e) => {
                warn!("beacon 엔드포인트 해석 실패: {e}");
                return false;
            }
        };

        // 응답을 기다리지 않고 런타임에 맡긴다
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("비동기 런타임 없음, beacon 전송 불가");
            return false;
        };

        let client = self.client.clone();
        let payload = payload.clone();
        handle.spawn(async move {
            if let Err(e) = post_payload(&client, url, &payload).await {
                warn!("beacon 전송 실패: {e}");
            }
        });
        true
    }
}
