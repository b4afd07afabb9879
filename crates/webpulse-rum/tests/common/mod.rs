//! 시나리오 테스트용 목 호스트.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use webpulse_core::config::AppConfig;
use webpulse_core::error::CoreError;
use webpulse_core::event_bus::EventBus;
use webpulse_core::models::cache::{RegistrationSnapshot, WorkerMessage, WorkerReply};
use webpulse_core::models::entry::{ObservationCategory, PerformanceEntry};
use webpulse_core::models::envelope::TelemetryPayload;
use webpulse_core::models::network::ConnectionInfo;
use webpulse_core::models::preload::LinkHint;
use webpulse_core::models::session::DeviceInfo;
use webpulse_core::ports::cache_worker::CacheWorkerHost;
use webpulse_core::ports::performance::{EntryCallback, ObserverHandle, PerformanceHost};
use webpulse_core::ports::preload_host::PreloadHost;
use webpulse_core::ports::transport::TelemetryTransport;
use webpulse_rum::{MemoryStore, RumHosts, RumPipeline, SamplingDecision};

/// 구독 콜백을 보관하고 테스트에서 엔트리를 흘려보내는 성능 호스트
#[derive(Default)]
pub struct ScriptedPerformanceHost {
    callbacks: Mutex<HashMap<ObservationCategory, EntryCallback>>,
    pub observe_calls: AtomicUsize,
    pub disconnects: Arc<AtomicUsize>,
}

struct Handle {
    disconnects: Arc<AtomicUsize>,
}

impl ObserverHandle for Handle {
    fn disconnect(&mut self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

impl ScriptedPerformanceHost {
    pub fn emit(&self, entry: PerformanceEntry) {
        let callback = self.callbacks.lock().get(&entry.category()).cloned();
        if let Some(cb) = callback {
            cb(entry);
        }
    }

    pub fn observe_calls(&self) -> usize {
        self.observe_calls.load(Ordering::SeqCst)
    }
}

impl PerformanceHost for ScriptedPerformanceHost {
    fn supported_categories(&self) -> Vec<ObservationCategory> {
        ObservationCategory::ALL.to_vec()
    }

    fn observe(
        &self,
        category: ObservationCategory,
        callback: EntryCallback,
    ) -> Result<Box<dyn ObserverHandle>, CoreError> {
        self.observe_calls.fetch_add(1, Ordering::SeqCst);
        self.callbacks.lock().insert(category, callback);
        Ok(Box::new(Handle {
            disconnects: self.disconnects.clone(),
        }))
    }
}

/// 전송 내역을 기록하는 텔레메트리 전송
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<TelemetryPayload>>,
    pub beacons: Mutex<Vec<TelemetryPayload>>,
    /// true면 `send`가 영원히 끝나지 않는다
    pub hang: AtomicBool,
}

impl RecordingTransport {
    pub fn network_calls(&self) -> usize {
        self.sent.lock().len() + self.beacons.lock().len()
    }
}

#[async_trait]
impl TelemetryTransport for RecordingTransport {
    async fn send(&self, _endpoint: &str, payload: &TelemetryPayload) -> Result<(), CoreError> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.sent.lock().push(payload.clone());
        Ok(())
    }

    fn send_beacon(&self, _endpoint: &str, payload: &TelemetryPayload) -> bool {
        self.beacons.lock().push(payload.clone());
        true
    }
}

/// 힌트를 즉시 완료 처리하는 프리로드 호스트
pub struct RecordingPreloadHost {
    pub connection: Option<ConnectionInfo>,
    pub loads: Mutex<Vec<LinkHint>>,
}

impl RecordingPreloadHost {
    pub fn new(effective_type: Option<&str>) -> Self {
        Self {
            connection: effective_type.map(ConnectionInfo::new),
            loads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PreloadHost for RecordingPreloadHost {
    async fn load_hint(&self, hint: &LinkHint) -> Result<(), CoreError> {
        self.loads.lock().push(hint.clone());
        Ok(())
    }

    fn connection_info(&self) -> Option<ConnectionInfo> {
        self.connection.clone()
    }
}

/// 캐시 워커 미지원 호스트
pub struct UnsupportedWorker;

#[async_trait]
impl CacheWorkerHost for UnsupportedWorker {
    fn is_supported(&self) -> bool {
        false
    }
    async fn register(&self, _: &str, _: &str) -> Result<RegistrationSnapshot, CoreError> {
        Err(CoreError::NotSupported("cache worker".into()))
    }
    async fn update(&self) -> Result<(), CoreError> {
        Ok(())
    }
    async fn unregister(&self) -> Result<bool, CoreError> {
        Ok(false)
    }
    async fn post_message(&self, _: WorkerMessage) -> Result<WorkerReply, CoreError> {
        Err(CoreError::NotSupported("cache worker".into()))
    }
    async fn cache_names(&self) -> Result<Vec<String>, CoreError> {
        Ok(Vec::new())
    }
    async fn cache_urls(&self, _: &str) -> Result<Vec<String>, CoreError> {
        Ok(Vec::new())
    }
    async fn delete_cache(&self, _: &str) -> Result<bool, CoreError> {
        Ok(false)
    }
    fn supports_background_sync(&self) -> bool {
        false
    }
    async fn register_sync(&self, _: &str) -> Result<(), CoreError> {
        Ok(())
    }
    fn reload_page(&self) {}
}

/// 조립된 파이프라인과 목 호스트
pub struct Harness {
    pub pipeline: RumPipeline,
    pub performance: Arc<ScriptedPerformanceHost>,
    pub transport: Arc<RecordingTransport>,
    pub preload: Arc<RecordingPreloadHost>,
    pub bus: EventBus,
}

pub fn device() -> DeviceInfo {
    DeviceInfo {
        user_agent: "Mozilla/5.0 (scenario)".into(),
        url: "https://example.com/".into(),
        language: Some("ko-KR".into()),
        ..DeviceInfo::default()
    }
}

pub fn harness_with(
    config: AppConfig,
    effective_type: Option<&str>,
    sampling: Option<SamplingDecision>,
) -> Harness {
    let performance = Arc::new(ScriptedPerformanceHost::default());
    let transport = Arc::new(RecordingTransport::default());
    let preload = Arc::new(RecordingPreloadHost::new(effective_type));
    let bus = EventBus::new(256);
    let hosts = RumHosts {
        performance: performance.clone(),
        transport: transport.clone(),
        preload: preload.clone(),
        cache_worker: Arc::new(UnsupportedWorker),
        store: Arc::new(MemoryStore::new()),
    };

    let pipeline = match sampling {
        Some(decision) => {
            RumPipeline::with_sampling(config, hosts, device(), bus.clone(), decision)
        }
        None => RumPipeline::new(config, hosts, device(), bus.clone()),
    }
    .expect("pipeline");

    Harness {
        pipeline,
        performance,
        transport,
        preload,
        bus,
    }
}

/// 샘플링된 기본 구성
pub fn sampled() -> Harness {
    harness_with(AppConfig::default_config(), None, Some(SamplingDecision::Sampled))
}

/// 스폰된 태스크(전송, 프리로드)가 진행되도록 양보
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
