//! 텔레메트리 배처.
//!
//! 봉투를 삽입 순서대로 모았다가 세 가지 시점에 하나의 페이로드로 전송한다.
//! - 배치가 `max_batch_size`에 도달했을 때 (즉시)
//! - 주기 타이머 (`flush_interval`)
//! - 페이지 해체/숨김 (비차단 beacon 전송)
//!
//! 전송은 최선 노력이다. 실패한 배치는 재시도하지 않고 버린다.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use webpulse_core::config::TelemetryConfig;
use webpulse_core::models::envelope::{Envelope, TelemetryPayload};
use webpulse_core::models::session::Session;
use webpulse_core::ports::transport::TelemetryTransport;

/// 전송 카운터 (spawn된 전송 태스크와 공유)
#[derive(Default)]
struct Counters {
    flushes: AtomicU64,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn record_sent(&self, count: usize) {
        self.sent.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn record_dropped(&self, count: usize) {
        self.dropped.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// 텔레메트리 배처
pub struct TelemetryBatcher {
    transport: Arc<dyn TelemetryTransport>,
    endpoint: String,
    max_batch_size: usize,
    flush_interval: Duration,
    session: RwLock<Session>,
    /// 현재 배치. flush 시 통째로 교체된다.
    batch: Mutex<Vec<Envelope>>,
    counters: Arc<Counters>,
}

impl TelemetryBatcher {
    /// 새 배처 생성
    pub fn new(
        transport: Arc<dyn TelemetryTransport>,
        session: Session,
        config: &TelemetryConfig,
    ) -> Self {
        let max_batch_size = config.max_batch_size.max(1);
        Self {
            transport,
            endpoint: config.endpoint.clone(),
            max_batch_size,
            flush_interval: config.flush_interval(),
            session: RwLock::new(session),
            batch: Mutex::new(Vec::with_capacity(max_batch_size)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// 봉투 추가
    ///
    /// 배치가 `max_batch_size`에 도달하면 즉시 flush하고 `true`를 반환한다.
    pub fn add(&self, envelope: Envelope) -> bool {
        let full = {
            let mut batch = self.batch.lock();
            batch.push(envelope);
            if batch.len() >= self.max_batch_size {
                Some(std::mem::take(&mut *batch))
            } else {
                None
            }
        };

        match full {
            Some(batch) => {
                debug!("배치 최대 크기 도달 ({}개), 즉시 flush", batch.len());
                self.dispatch(batch, false);
                true
            }
            None => false,
        }
    }

    /// 현재 배치를 비우고 전송 (반환 시점에 네트워크 왕복을 기다리지 않는다)
    ///
    /// `is_unloading`이면 호스트의 beacon 전송을 사용한다. 그렇지 않으면
    /// 현재 tokio 런타임에 전송 태스크를 띄운다.
    pub fn flush(&self, is_unloading: bool) {
        let batch = self.take_batch();
        if batch.is_empty() {
            return;
        }
        self.dispatch(batch, is_unloading);
    }

    /// 현재 배치를 전송하고 완료까지 대기 (타이머/종료 경로)
    ///
    /// 전송한 봉투 수를 반환한다. 실패 시 0.
    pub async fn flush_now(&self) -> usize {
        let batch = self.take_batch();
        if batch.is_empty() {
            return 0;
        }
        let count = batch.len();
        let payload = self.payload(batch);
        self.counters.flushes.fetch_add(1, Ordering::Relaxed);
        let delivered = deliver(
            self.transport.as_ref(),
            &self.endpoint,
            &payload,
            &self.counters,
        )
        .await;
        if delivered {
            count
        } else {
            0
        }
    }

    /// 주기적 flush 태스크 시작
    ///
    /// `shutdown`에 `true`가 전달되면 종료한다.
    pub fn start_flush_timer(
        self: &Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let batcher = Arc::clone(self);
        let period = self.flush_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // 첫 tick은 즉시 반환되므로 건너뜀
            ticker.tick().await;
            info!("텔레메트리 flush 타이머 시작 (주기 {}ms)", period.as_millis());

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !batcher.is_empty() {
                            batcher.flush_now().await;
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("텔레메트리 flush 타이머 종료");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// 사용자 ID 교체 (이후 페이로드부터 반영)
    pub fn set_user(&self, user_id: &str) {
        self.session.write().user_id = user_id.to_string();
    }

    /// 현재 세션 스냅샷
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    /// 현재 배치 길이
    pub fn len(&self) -> usize {
        self.batch.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.lock().is_empty()
    }

    /// 배처 통계
    pub fn stats(&self) -> BatchStats {
        BatchStats {
            queued: self.len(),
            max_batch_size: self.max_batch_size,
            flushes: self.counters.flushes.load(Ordering::Relaxed),
            sent: self.counters.sent.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    fn take_batch(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.batch.lock())
    }

    fn payload(&self, batch: Vec<Envelope>) -> TelemetryPayload {
        TelemetryPayload::new(batch, &self.session.read())
    }

    fn dispatch(&self, batch: Vec<Envelope>, is_unloading: bool) {
        let count = batch.len();
        let payload = self.payload(batch);
        self.counters.flushes.fetch_add(1, Ordering::Relaxed);

        if is_unloading {
            if self.transport.send_beacon(&self.endpoint, &payload) {
                debug!("beacon 전송 수락: {count}개 봉투");
                self.counters.record_sent(count);
            } else {
                warn!("beacon 전송 거부됨, {count}개 봉투 폐기");
                self.counters.record_dropped(count);
            }
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let transport = Arc::clone(&self.transport);
                let endpoint = self.endpoint.clone();
                let counters = Arc::clone(&self.counters);
                handle.spawn(async move {
                    deliver(transport.as_ref(), &endpoint, &payload, &counters).await;
                });
            }
            Err(_) => {
                warn!("비동기 런타임 없음, {count}개 봉투 폐기");
                self.counters.record_dropped(count);
            }
        }
    }
}

async fn deliver(
    transport: &dyn TelemetryTransport,
    endpoint: &str,
    payload: &TelemetryPayload,
    counters: &Counters,
) -> bool {
    let count = payload.batch.len();
    match transport.send(endpoint, payload).await {
        Ok(()) => {
            debug!("텔레메트리 전송 성공: {count}개 봉투");
            counters.record_sent(count);
            true
        }
        Err(e) => {
            warn!("텔레메트리 전송 실패, {count}개 봉투 폐기: {e}");
            counters.record_dropped(count);
            false
        }
    }
}

/// 배처 통계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    /// 현재 배치에 쌓인 봉투 수
    pub queued: usize,
    /// 최대 배치 크기
    pub max_batch_size: usize,
    /// 전송 시도 횟수
    pub flushes: u64,
    /// 전송 성공한 봉투 수 (beacon은 수락 기준)
    pub sent: u64,
    /// 폐기된 봉투 수
    pub dropped: u64,
}
