//! RUM 파이프라인 부트스트랩.
//!
//! 호스트 포트들을 주입받아 관측 집합, 배처, 프리로드 스케줄러, 캐시 워커 관리자,
//! 연결 감시기를 만들고 수명을 관리한다. 전역 상태는 없다.
//!
//! 샘플링에서 빠진 세션은 관측 집합과 배처를 아예 만들지 않는다
//! (구독 0건, 텔레메트리 전송 0건). 프리로드와 캐시 워커는 샘플링과 무관하게 동작한다.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;
use webpulse_cache::CacheLifecycleManager;
use webpulse_core::config::AppConfig;
use webpulse_core::error::CoreError;
use webpulse_core::event_bus::EventBus;
use webpulse_core::models::entry::ObservationCategory;
use webpulse_core::models::envelope::{now_millis, Envelope};
use webpulse_core::models::host_event::HostEvent;
use webpulse_core::models::metric::Metric;
use webpulse_core::models::session::{DeviceInfo, Session};
use webpulse_core::ports::cache_worker::CacheWorkerHost;
use webpulse_core::ports::performance::PerformanceHost;
use webpulse_core::ports::preload_host::PreloadHost;
use webpulse_core::ports::storage::DurableStore;
use webpulse_core::ports::transport::TelemetryTransport;
use webpulse_monitor::{MetricObserverSet, MetricSink, VitalsSummary};
use webpulse_network::{BatchStats, ConnectivityMonitor, TelemetryBatcher};
use webpulse_preload::ResourcePreloadScheduler;

use crate::error_tracking::error_envelope;
use crate::sampling::SamplingDecision;
use crate::session::SessionFactory;

/// 파이프라인이 사용하는 호스트 포트 묶음
#[derive(Clone)]
pub struct RumHosts {
    pub performance: Arc<dyn PerformanceHost>,
    pub transport: Arc<dyn TelemetryTransport>,
    pub preload: Arc<dyn PreloadHost>,
    pub cache_worker: Arc<dyn CacheWorkerHost>,
    pub store: Arc<dyn DurableStore>,
}

/// 샘플링된 세션에만 존재하는 텔레메트리 구성 요소
struct Telemetry {
    observers: MetricObserverSet,
    batcher: Arc<TelemetryBatcher>,
}

/// RUM 파이프라인
pub struct RumPipeline {
    config: AppConfig,
    bus: EventBus,
    sampling: SamplingDecision,
    telemetry: Option<Telemetry>,
    sessions: SessionFactory,
    preloader: ResourcePreloadScheduler,
    cache: Arc<CacheLifecycleManager>,
    connectivity: ConnectivityMonitor,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl RumPipeline {
    /// 설정의 샘플링 비율로 한 번 결정해 생성
    pub fn new(
        config: AppConfig,
        hosts: RumHosts,
        device: DeviceInfo,
        bus: EventBus,
    ) -> Result<Self, CoreError> {
        let sampling = SamplingDecision::decide(config.telemetry.sample_rate);
        Self::with_sampling(config, hosts, device, bus, sampling)
    }

    /// 샘플링 결정을 지정해 생성
    pub fn with_sampling(
        config: AppConfig,
        hosts: RumHosts,
        device: DeviceInfo,
        bus: EventBus,
        sampling: SamplingDecision,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let origin = Url::parse(&device.url)
            .map_err(|e| CoreError::Config(format!("잘못된 페이지 URL '{}': {e}", device.url)))?;

        let connectivity = ConnectivityMonitor::new(true, device.connection.clone());
        let sessions = SessionFactory::new(hosts.store.clone());

        let telemetry = if sampling.is_sampled() {
            let session = sessions.create(device);
            info!(
                "RUM 세션 샘플링됨: {} (비율 {})",
                session.session_id, config.telemetry.sample_rate
            );
            let batcher = Arc::new(TelemetryBatcher::new(
                hosts.transport.clone(),
                session,
                &config.telemetry,
            ));
            // 관측된 지표는 엔트리 콜백 안에서 바로 배치에 들어간다
            let sink: MetricSink = {
                let batcher = Arc::clone(&batcher);
                Arc::new(move |metric: &Metric| {
                    batcher.add(Envelope::from(metric));
                })
            };
            Some(Telemetry {
                observers: MetricObserverSet::with_sink(
                    hosts.performance.clone(),
                    bus.clone(),
                    sink,
                ),
                batcher,
            })
        } else {
            debug!(
                "RUM 세션 샘플링 제외 (비율 {}), 관측/배치 비활성",
                config.telemetry.sample_rate
            );
            None
        };

        let preloader =
            ResourcePreloadScheduler::new(hosts.preload.clone(), &config.preload, origin);
        let cache = Arc::new(CacheLifecycleManager::new(
            hosts.cache_worker.clone(),
            bus.clone(),
            config.cache.clone(),
        ));
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            bus,
            sampling,
            telemetry,
            sessions,
            preloader,
            cache,
            connectivity,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// 관측 구독, flush 타이머, 프리로드 동시성 조정, 캐시 워커 등록
    pub async fn start(&self) {
        if let Some(telemetry) = &self.telemetry {
            let timer = telemetry
                .batcher
                .start_flush_timer(self.shutdown_tx.subscribe());
            self.tasks.lock().push(timer);

            let categories = self.enabled_categories();
            let subscribed = telemetry.observers.observe_all(&categories);
            info!("성능 관측 시작: {subscribed}/{}개 카테고리", categories.len());
        }

        self.preloader.adapt_to_connection_speed();

        self.cache.register().await;
        let polling = self
            .cache
            .start_update_polling(self.shutdown_tx.subscribe());
        self.tasks.lock().push(polling);
    }

    fn enabled_categories(&self) -> Vec<ObservationCategory> {
        let telemetry = &self.config.telemetry;
        ObservationCategory::ALL
            .into_iter()
            .filter(|category| match category {
                ObservationCategory::Resource => telemetry.enable_resource_timings,
                ObservationCategory::Measure => telemetry.enable_user_timings,
                _ => true,
            })
            .collect()
    }

    /// 호스트 이벤트 처리
    pub async fn handle(&self, event: HostEvent) {
        match event {
            HostEvent::PageLoad { load_time_ms } => {
                if let Some(telemetry) = &self.telemetry {
                    telemetry.observers.stop_after(self.config.observer.stop_grace());
                }
                let mut data = Map::new();
                if let Some(ms) = load_time_ms {
                    data.insert("loadTime".into(), Value::from(ms));
                }
                self.track_interaction("page_load", data);
            }
            HostEvent::VisibilityChange { hidden } => {
                if hidden {
                    self.flush(true);
                }
            }
            HostEvent::PageUnload => {
                if let Some(telemetry) = &self.telemetry {
                    let elapsed = telemetry.batcher.session().elapsed_ms(now_millis());
                    let mut data = Map::new();
                    data.insert("timeOnPage".into(), Value::from(elapsed));
                    self.track_interaction("engagement", data);
                }
                self.flush(true);
            }
            HostEvent::ConnectivityChange { online, connection } => {
                let changed = self.connectivity.update(online, connection.clone());
                if changed {
                    self.cache.on_connectivity_change(online).await;
                }
                if let Some(info) = connection.as_ref() {
                    self.preloader.apply_connection(Some(info));
                }
            }
            HostEvent::PointerEnterLink { href } => {
                self.preloader.on_link_hover(&href);
            }
            HostEvent::ElementVisible { element_id } => {
                self.preloader.on_element_visible(&element_id);
            }
            HostEvent::UncaughtError { .. } | HostEvent::UnhandledRejection { .. } => {
                if !self.config.telemetry.enable_error_tracking {
                    return;
                }
                if let Some(envelope) = error_envelope(&event) {
                    self.add(envelope);
                }
            }
            HostEvent::RouteChange { path } => {
                self.preloader.set_current_path(&path);
                self.preloader.preload_likely_next();
            }
        }
    }

    /// 애플리케이션 에러 기록
    pub fn track_error(&self, message: &str, data: Map<String, Value>) -> bool {
        self.add(Envelope::error(message, data))
    }

    /// 사용자 상호작용 기록
    pub fn track_interaction(&self, name: &str, data: Map<String, Value>) -> bool {
        self.add(Envelope::interaction(name, data))
    }

    /// 애플리케이션 정의 이벤트 기록
    pub fn track_event(&self, name: &str, data: Map<String, Value>) -> bool {
        self.add(Envelope::custom_event(name, data))
    }

    /// 사용자 ID 교체 (저장 + 이후 페이로드 반영)
    pub fn set_user(&self, user_id: &str) {
        if let Err(e) = self.sessions.persist_user(user_id) {
            warn!("사용자 ID 저장 실패: {e}");
        }
        if let Some(telemetry) = &self.telemetry {
            telemetry.batcher.set_user(user_id);
        }
    }

    /// 샘플링된 세션이면 배치에 추가
    fn add(&self, envelope: Envelope) -> bool {
        match &self.telemetry {
            Some(telemetry) => {
                telemetry.batcher.add(envelope);
                true
            }
            None => false,
        }
    }

    /// 현재 배치 flush (기다리지 않음)
    pub fn flush(&self, is_unloading: bool) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.batcher.flush(is_unloading);
        }
    }

    /// 타이머 중지, 관측 해제, 남은 배치 전송
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);

        let tasks: Vec<_> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.abort();
        }

        if let Some(telemetry) = &self.telemetry {
            telemetry.observers.disconnect();
            let sent = telemetry.batcher.flush_now().await;
            info!("RUM 파이프라인 종료: 마지막 배치 {sent}개 전송");
        }
    }

    pub fn is_sampled(&self) -> bool {
        self.sampling.is_sampled()
    }

    /// 현재 세션 (샘플링된 경우)
    pub fn session(&self) -> Option<Session> {
        self.telemetry.as_ref().map(|t| t.batcher.session())
    }

    /// Core Web Vitals 요약 (샘플링된 경우)
    pub fn summary(&self) -> Option<VitalsSummary> {
        self.telemetry.as_ref().map(|t| t.observers.summary())
    }

    pub fn observers(&self) -> Option<&MetricObserverSet> {
        self.telemetry.as_ref().map(|t| &t.observers)
    }

    pub fn batch_stats(&self) -> Option<BatchStats> {
        self.telemetry.as_ref().map(|t| t.batcher.stats())
    }

    pub fn preloader(&self) -> &ResourcePreloadScheduler {
        &self.preloader
    }

    pub fn cache(&self) -> &CacheLifecycleManager {
        &self.cache
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}
