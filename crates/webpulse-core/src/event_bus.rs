//! 애플리케이션 이벤트 버스.
//!
//! `tokio::broadcast` 기반 타입드 발행/구독. 특정 호스트 이벤트 시스템에 묶이지 않는다.

use tokio::sync::broadcast;
use tracing::debug;

use crate::models::metric::Metric;

/// 파이프라인이 발행하는 애플리케이션 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// 새 지표 분류 완료
    MetricObserved(Metric),
    /// 새 캐시 워커 버전이 대기 중 (사용자 확인 필요)
    UpdateAvailable,
    /// 최초 설치 완료 (오프라인 사용 가능)
    FirstInstall,
    /// 온라인 전환
    AppOnline,
    /// 오프라인 전환
    AppOffline,
    /// 페이지 제어 워커 교체됨
    ControllerChanged,
}

impl PipelineEvent {
    /// 이벤트 이름 (로그/디버그용)
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::MetricObserved(_) => "metric-observed",
            PipelineEvent::UpdateAvailable => "update-available",
            PipelineEvent::FirstInstall => "first-install",
            PipelineEvent::AppOnline => "app-online",
            PipelineEvent::AppOffline => "app-offline",
            PipelineEvent::ControllerChanged => "controller-changed",
        }
    }
}

/// 이벤트 버스. 복제본은 같은 채널을 공유한다.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// 새 이벤트 버스 생성
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행. 구독자가 없으면 조용히 버려진다.
    pub fn publish(&self, event: PipelineEvent) {
        debug!("이벤트 발행: {}", event.name());
        let _ = self.tx.send(event);
    }

    /// 구독자 생성
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// 현재 구독자 수
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
