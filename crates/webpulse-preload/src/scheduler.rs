//! 리소스 프리로드 스케줄러.
//!
//! 모든 프리로드 요청은 같은 경로를 거친다.
//! 1. 중복 제거 집합 확인과 등록을 한 번의 락 구간에서 처리 (중간에 await 없음)
//! 2. 진행 중 개수가 `max_concurrent` 미만이면 즉시 시작, 아니면 대기열에 추가
//! 3. 완료(성공/실패 무관) 시 진행 중 개수를 줄이고 대기열에서 하나를 꺼내 시작
//!
//! 프리로드는 최적화일 뿐이므로 실패는 debug 로그만 남기고 재시도하지 않는다.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};
use url::Url;
use webpulse_core::config::PreloadConfig;
use webpulse_core::models::network::{ConnectionInfo, NetworkClass};
use webpulse_core::models::preload::{LinkHint, PreloadKind, PreloadPriority, PreloadTask};
use webpulse_core::ports::preload_host::PreloadHost;

use crate::routes::{normalize_path, RouteTable};

/// 프리로드 요청 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadOutcome {
    /// 이미 요청된 URL (아무 작업도 하지 않음)
    Skipped,
    /// 로드 완료
    Completed,
    /// 로드 실패 (흐름 제어상으로는 완료로 취급)
    Failed,
}

/// 스케줄러 진단 통계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadStats {
    /// 지금까지 요청된 고유 URL 수
    pub preloaded: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub completed: u64,
    pub failed: u64,
    pub max_concurrent: usize,
}

/// 연결 등급별 동시 프리로드 상한
pub fn concurrency_for(class: NetworkClass, default: usize) -> usize {
    match class {
        NetworkClass::Slow2g | NetworkClass::TwoG => 1,
        NetworkClass::ThreeG => 2,
        NetworkClass::FourG | NetworkClass::Ethernet => 4,
        NetworkClass::Unknown => default,
    }
}

struct Job {
    task: PreloadTask,
    done: oneshot::Sender<PreloadOutcome>,
}

struct SchedulerState {
    /// 요청 시점에 등록되는 중복 제거 집합
    seen: HashSet<String>,
    in_flight: usize,
    max_concurrent: usize,
    queue: VecDeque<Job>,
    network: NetworkClass,
}

struct Inner {
    host: Arc<dyn PreloadHost>,
    routes: RouteTable,
    origin: Url,
    default_concurrency: usize,
    hover_asset_delay: Duration,
    predictive_limit: usize,
    viewport_margin_px: u32,
    state: Mutex<SchedulerState>,
    current_path: RwLock<String>,
    /// 뷰포트 진입 대기 요소 (element id → 작업)
    viewport_targets: Mutex<HashMap<String, PreloadTask>>,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl Inner {
    /// 슬롯을 차지한 작업 실행
    ///
    /// 런타임 밖이면 실패로 기록하고 슬롯을 바로 반환한다.
    fn start(self: &Arc<Self>, job: Job) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(self);
                handle.spawn(async move {
                    let outcome = inner.load(&job.task).await;
                    let _ = job.done.send(outcome);
                    inner.release();
                });
            }
            Err(_) => {
                debug!("비동기 런타임 없음, 프리로드 건너뜀: {}", job.task.url);
                self.failed.fetch_add(1, Ordering::Relaxed);
                let _ = job.done.send(PreloadOutcome::Failed);
                self.release();
            }
        }
    }

    async fn load(&self, task: &PreloadTask) -> PreloadOutcome {
        let hint = LinkHint::for_task(task);
        match self.host.load_hint(&hint).await {
            Ok(()) => {
                debug!("프리로드 완료: {} ({})", task.url, hint.rel.as_str());
                self.completed.fetch_add(1, Ordering::Relaxed);
                PreloadOutcome::Completed
            }
            Err(e) => {
                debug!("프리로드 실패 (무시): {}: {e}", task.url);
                self.failed.fetch_add(1, Ordering::Relaxed);
                PreloadOutcome::Failed
            }
        }
    }

    /// 진행 중 슬롯 반환 후 대기열 진행
    fn release(self: &Arc<Self>) {
        let next = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            take_startable(&mut state)
        };
        for job in next {
            self.start(job);
        }
    }
}

/// 상한 안에서 시작 가능한 대기 작업을 꺼내고 슬롯을 차지
fn take_startable(state: &mut SchedulerState) -> Vec<Job> {
    let mut jobs = Vec::new();
    while state.in_flight < state.max_concurrent {
        let Some(job) = state.queue.pop_front() else {
            break;
        };
        state.in_flight += 1;
        jobs.push(job);
    }
    jobs
}

/// 리소스 프리로드 스케줄러. 복제본은 같은 상태를 공유한다.
///
/// 작업은 현재 tokio 런타임에서 실행된다. 런타임 밖에서 들어온 요청은 실패로 집계된다.
#[derive(Clone)]
pub struct ResourcePreloadScheduler {
    inner: Arc<Inner>,
}

impl ResourcePreloadScheduler {
    /// 새 스케줄러 생성
    ///
    /// `origin`: 현재 페이지 origin (내부 링크 판정 기준)
    pub fn new(host: Arc<dyn PreloadHost>, config: &PreloadConfig, origin: Url) -> Self {
        let max_concurrent = config.max_concurrent.max(1);
        let current_path = normalize_path(origin.path()).to_string();
        Self {
            inner: Arc::new(Inner {
                host,
                routes: RouteTable::new(config.routes.clone()),
                origin,
                default_concurrency: max_concurrent,
                hover_asset_delay: config.hover_asset_delay(),
                predictive_limit: config.predictive_limit,
                viewport_margin_px: config.viewport_margin_px,
                state: Mutex::new(SchedulerState {
                    seen: HashSet::new(),
                    in_flight: 0,
                    max_concurrent,
                    queue: VecDeque::new(),
                    network: NetworkClass::Unknown,
                }),
                current_path: RwLock::new(current_path),
                viewport_targets: Mutex::new(HashMap::new()),
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
        }
    }

    /// 프리로드하고 완료까지 대기
    ///
    /// 이미 요청된 URL이면 즉시 `Skipped`.
    pub async fn preload(
        &self,
        url: &str,
        kind: PreloadKind,
        priority: PreloadPriority,
    ) -> PreloadOutcome {
        match self.request(PreloadTask::new(url, kind, priority)) {
            Some(done) => done.await.unwrap_or(PreloadOutcome::Failed),
            None => PreloadOutcome::Skipped,
        }
    }

    /// 프리로드 요청 (완료를 기다리지 않음)
    ///
    /// 새로 요청되었으면 `true`, 중복이면 `false`.
    pub fn enqueue(&self, task: PreloadTask) -> bool {
        self.request(task).is_some()
    }

    fn request(&self, task: PreloadTask) -> Option<oneshot::Receiver<PreloadOutcome>> {
        let (tx, rx) = oneshot::channel();
        let start = {
            let mut state = self.inner.state.lock();
            if !state.seen.insert(task.url.clone()) {
                return None;
            }
            let job = Job { task, done: tx };
            if state.in_flight < state.max_concurrent {
                state.in_flight += 1;
                Some(job)
            } else {
                debug!(
                    "프리로드 대기열 추가: {} (진행 중 {}/{})",
                    job.task.url, state.in_flight, state.max_concurrent
                );
                state.queue.push_back(job);
                None
            }
        };

        if let Some(job) = start {
            self.inner.start(job);
        }
        Some(rx)
    }

    /// 호스트가 보고하는 연결 정보로 동시성 재조정
    pub fn adapt_to_connection_speed(&self) -> usize {
        let info = self.inner.host.connection_info();
        self.apply_connection(info.as_ref())
    }

    /// 주어진 연결 정보로 동시성 재조정
    ///
    /// 빠른 네트워크(4g/ethernet)로 판정되면 다음 라우트 예측 프리로드를 시작한다.
    /// 새 상한을 반환한다.
    pub fn apply_connection(&self, info: Option<&ConnectionInfo>) -> usize {
        let class = info.map(ConnectionInfo::class).unwrap_or(NetworkClass::Unknown);
        let limit = concurrency_for(class, self.inner.default_concurrency);

        let startable = {
            let mut state = self.inner.state.lock();
            state.network = class;
            state.max_concurrent = limit;
            take_startable(&mut state)
        };
        for job in startable {
            self.inner.start(job);
        }

        info!("연결 등급 {class}: 동시 프리로드 상한 {limit}");
        if class.is_fast() {
            self.preload_likely_next();
        }
        limit
    }

    /// 뷰포트 진입 시 프리로드할 요소 등록
    pub fn register_viewport_target(&self, element_id: &str, task: PreloadTask) {
        self.inner
            .viewport_targets
            .lock()
            .insert(element_id.to_string(), task);
    }

    /// 요소가 (선행 여백 포함) 뷰포트에 들어옴
    ///
    /// 요소당 한 번만 발동하며, 발동 후 감시 대상에서 빠진다.
    pub fn on_element_visible(&self, element_id: &str) -> bool {
        let task = self.inner.viewport_targets.lock().remove(element_id);
        match task {
            Some(task) => {
                debug!("뷰포트 진입 프리로드: {element_id} → {}", task.url);
                self.enqueue(task)
            }
            None => false,
        }
    }

    /// 호스트가 뷰포트 감시에 사용할 선행 여백 (px)
    pub fn viewport_margin_px(&self) -> u32 {
        self.inner.viewport_margin_px
    }

    /// 링크에 포인터 진입
    ///
    /// 내부 링크이고 현재 위치가 아니며 라우트 테이블에 있으면
    /// 번들을 즉시, 핵심 자산을 짧은 지연 후 프리로드한다.
    pub fn on_link_hover(&self, href: &str) -> bool {
        let Some(path) = self.internal_path(href) else {
            return false;
        };
        if path == *self.inner.current_path.read() {
            return false;
        }
        let Some(route) = self.inner.routes.get(&path) else {
            return false;
        };

        self.enqueue(PreloadTask::new(
            route.bundle.clone(),
            PreloadKind::Script,
            PreloadPriority::High,
        ));

        let assets = route.critical_assets.clone();
        if !assets.is_empty() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let scheduler = self.clone();
                    let delay = self.inner.hover_asset_delay;
                    handle.spawn(async move {
                        tokio::time::sleep(delay).await;
                        for task in assets {
                            scheduler.enqueue(task);
                        }
                    });
                }
                Err(_) => debug!("비동기 런타임 없음, 지연 자산 프리로드 건너뜀: {path}"),
            }
        }
        debug!("hover 라우트 프리로드: {path}");
        true
    }

    /// 현재 경로 기준 다음 라우트 예측 프리로드
    ///
    /// 빠른 네트워크에서만 동작한다. 새로 요청된 작업 수를 반환한다.
    pub fn preload_likely_next(&self) -> usize {
        let network = self.inner.state.lock().network;
        if !network.is_fast() {
            debug!("예측 프리로드 건너뜀 (연결 등급 {network})");
            return 0;
        }

        let current = self.inner.current_path.read().clone();
        let tasks: Vec<PreloadTask> = self
            .inner
            .routes
            .likely_next(&current, self.inner.predictive_limit)
            .into_iter()
            .flat_map(|route| {
                let bundle = PreloadTask::new(
                    route.bundle.clone(),
                    PreloadKind::Script,
                    PreloadPriority::Low,
                );
                let assets = route
                    .critical_assets
                    .iter()
                    .map(|a| PreloadTask::new(a.url.clone(), a.kind, PreloadPriority::Low));
                std::iter::once(bundle).chain(assets).collect::<Vec<_>>()
            })
            .collect();

        tasks.into_iter().filter(|t| self.enqueue(t.clone())).count()
    }

    /// 현재 경로 갱신 (라우트 전환)
    pub fn set_current_path(&self, path: &str) {
        *self.inner.current_path.write() = normalize_path(path).to_string();
    }

    pub fn current_path(&self) -> String {
        self.inner.current_path.read().clone()
    }

    /// 진단 통계
    pub fn stats(&self) -> PreloadStats {
        let state = self.inner.state.lock();
        PreloadStats {
            preloaded: state.seen.len(),
            queued: state.queue.len(),
            in_flight: state.in_flight,
            completed: self.inner.completed.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            max_concurrent: state.max_concurrent,
        }
    }

    /// 같은 origin 링크면 정규화된 경로 반환
    fn internal_path(&self, href: &str) -> Option<String> {
        let url = self.inner.origin.join(href).ok()?;
        if url.origin() != self.inner.origin.origin() {
            return None;
        }
        Some(normalize_path(url.path()).to_string())
    }
}
