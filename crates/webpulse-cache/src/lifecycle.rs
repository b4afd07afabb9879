//! 캐시 워커 생명주기 관리자.
//!
//! 상태 전이:
//! - `Unregistered → Installing`: 등록 성공
//! - `Installing → Waiting`: 설치 완료 + 기존 워커가 페이지를 제어 중 (`update-available`)
//! - `Installing → Active`: 설치 완료 + 기존 워커 없음 (`first-install`)
//! - `Waiting → Active`: 호출자의 `skip_waiting` 이후 제어 워커 교체 시에만. 이때 한 번 새로고침.
//! - `Active → Installing`: 새 버전 발견
//!
//! 등록 실패는 치명적이지 않다. 상태만 보고하고 나머지 앱은 오프라인 기능 없이 동작한다.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use webpulse_core::config::CacheConfig;
use webpulse_core::event_bus::{EventBus, PipelineEvent};
use webpulse_core::models::cache::{
    CacheInfo, CacheWorkerState, RegistrationSnapshot, RegistrationStatus, WorkerMessage,
    WorkerPhase,
};
use webpulse_core::ports::cache_worker::CacheWorkerHost;

/// 캐시 워커 생명주기 관리자
pub struct CacheLifecycleManager {
    host: Arc<dyn CacheWorkerHost>,
    bus: EventBus,
    config: CacheConfig,
    state: RwLock<CacheWorkerState>,
    status: RwLock<RegistrationStatus>,
    /// 페이지를 제어 중인 워커 존재 여부
    has_controller: AtomicBool,
    /// skip-waiting 이후 첫 제어 워커 교체에서만 새로고침 (한 번 소비)
    reload_armed: AtomicBool,
}

impl CacheLifecycleManager {
    pub fn new(host: Arc<dyn CacheWorkerHost>, bus: EventBus, config: CacheConfig) -> Self {
        Self {
            host,
            bus,
            config,
            state: RwLock::new(CacheWorkerState::Unregistered),
            status: RwLock::new(RegistrationStatus::NotRegistered),
            has_controller: AtomicBool::new(false),
            reload_armed: AtomicBool::new(false),
        }
    }

    /// 워커 등록
    ///
    /// 실패해도 에러를 반환하지 않고 상태로 보고한다.
    pub async fn register(&self) -> RegistrationStatus {
        if !self.host.is_supported() {
            info!("캐시 워커 미지원 호스트, 오프라인 기능 없이 계속");
            return self.set_status(RegistrationStatus::NotSupported);
        }

        let snapshot = match self
            .host
            .register(&self.config.worker_url, &self.config.scope)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("캐시 워커 등록 실패: {e}");
                return self.set_status(RegistrationStatus::NotRegistered);
            }
        };

        info!(
            "캐시 워커 등록 완료: scope={} (controller={})",
            snapshot.scope, snapshot.has_controller
        );
        self.apply_snapshot(&snapshot);
        self.set_status(RegistrationStatus::Registered {
            scope: snapshot.scope,
        })
    }

    fn apply_snapshot(&self, snapshot: &RegistrationSnapshot) {
        self.has_controller
            .store(snapshot.has_controller, Ordering::SeqCst);

        if snapshot.waiting && snapshot.has_controller {
            // 이전 방문에서 설치된 업데이트가 대기 중
            self.transition(CacheWorkerState::Waiting);
            self.bus.publish(PipelineEvent::UpdateAvailable);
        } else if snapshot.installing || !snapshot.active {
            self.transition(CacheWorkerState::Installing);
        } else {
            self.transition(CacheWorkerState::Active);
        }
    }

    /// 새 워커 버전 발견 (`updatefound`)
    pub fn on_update_found(&self) {
        self.transition(CacheWorkerState::Installing);
    }

    /// 설치 중 워커의 단계 변화
    pub fn on_worker_phase(&self, phase: WorkerPhase) {
        debug!("캐시 워커 단계: {phase:?}");
        match phase {
            WorkerPhase::Installing => self.transition(CacheWorkerState::Installing),
            WorkerPhase::Installed => {
                if self.state() != CacheWorkerState::Installing {
                    return;
                }
                if self.has_controller.load(Ordering::SeqCst) {
                    info!("새 캐시 워커 버전 대기 중 (사용자 확인 필요)");
                    self.transition(CacheWorkerState::Waiting);
                    self.bus.publish(PipelineEvent::UpdateAvailable);
                } else {
                    info!("캐시 워커 최초 설치 완료, 오프라인 사용 가능");
                    self.transition(CacheWorkerState::Active);
                    self.bus.publish(PipelineEvent::FirstInstall);
                }
            }
            WorkerPhase::Activating | WorkerPhase::Activated => {}
            WorkerPhase::Redundant => {
                let state = self.state();
                if matches!(
                    state,
                    CacheWorkerState::Installing | CacheWorkerState::Waiting
                ) {
                    warn!("캐시 워커 설치 폐기됨 ({state})");
                    let fallback = if self.has_controller.load(Ordering::SeqCst) {
                        CacheWorkerState::Active
                    } else {
                        CacheWorkerState::Unregistered
                    };
                    self.transition(fallback);
                }
            }
        }
    }

    /// 대기 중 워커 활성화 요청
    ///
    /// `Waiting` 상태에서만 동작한다. 실제 `Active` 전환은 이후
    /// 제어 워커 교체(`on_controller_change`) 시점에 일어난다.
    pub async fn skip_waiting(&self) -> bool {
        if self.state() != CacheWorkerState::Waiting {
            debug!("대기 중 워커 없음, skip-waiting 무시");
            return false;
        }

        self.reload_armed.store(true, Ordering::SeqCst);
        match self.host.post_message(WorkerMessage::SkipWaiting).await {
            Ok(_) => {
                info!("skip-waiting 요청 전송");
                true
            }
            Err(e) => {
                error!("skip-waiting 요청 실패: {e}");
                self.reload_armed.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// 페이지 제어 워커 교체 (`controllerchange`)
    pub fn on_controller_change(&self) {
        self.has_controller.store(true, Ordering::SeqCst);
        self.bus.publish(PipelineEvent::ControllerChanged);

        if !self.reload_armed.swap(false, Ordering::SeqCst) {
            debug!("skip-waiting 없이 발생한 제어 워커 교체, 새로고침 안 함");
            return;
        }

        if self.state() == CacheWorkerState::Waiting {
            self.transition(CacheWorkerState::Active);
        }
        info!("새 캐시 워커 활성화, 페이지 새로고침");
        self.host.reload_page();
    }

    /// 주기적 업데이트 확인 태스크 시작
    pub fn start_update_polling(
        self: &Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let period = self.config.update_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !matches!(manager.status(), RegistrationStatus::Registered { .. }) {
                            continue;
                        }
                        if let Err(e) = manager.host.update().await {
                            warn!("캐시 워커 업데이트 확인 실패: {e}");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("캐시 워커 업데이트 확인 종료");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// 온라인/오프라인 전환 반영
    ///
    /// 온라인 복귀 시 호스트가 지원하면 백그라운드 동기화를 요청한다.
    pub async fn on_connectivity_change(&self, online: bool) {
        if !online {
            self.bus.publish(PipelineEvent::AppOffline);
            return;
        }

        self.bus.publish(PipelineEvent::AppOnline);
        if !self.host.supports_background_sync() {
            return;
        }
        match self.host.register_sync(&self.config.sync_tag).await {
            Ok(()) => debug!("백그라운드 동기화 요청: {}", self.config.sync_tag),
            Err(e) => warn!("백그라운드 동기화 요청 실패: {e}"),
        }
    }

    /// 이름 있는 캐시 목록과 항목
    pub async fn get_cache_info(&self) -> Vec<CacheInfo> {
        let names = match self.host.cache_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!("캐시 목록 조회 실패: {e}");
                return Vec::new();
            }
        };

        let mut infos = Vec::with_capacity(names.len());
        for name in names {
            match self.host.cache_urls(&name).await {
                Ok(urls) => infos.push(CacheInfo {
                    entry_count: urls.len(),
                    name,
                    urls,
                }),
                Err(e) => warn!("캐시 항목 조회 실패 ({name}): {e}"),
            }
        }
        infos
    }

    /// 모든 이름 있는 캐시 삭제
    ///
    /// 하나라도 실패하면 `false`.
    pub async fn clear_all_caches(&self) -> bool {
        let names = match self.host.cache_names().await {
            Ok(names) => names,
            Err(e) => {
                error!("캐시 목록 조회 실패: {e}");
                return false;
            }
        };

        let mut all_deleted = true;
        for name in &names {
            match self.host.delete_cache(name).await {
                Ok(true) => debug!("캐시 삭제: {name}"),
                Ok(false) => {
                    warn!("캐시 삭제되지 않음: {name}");
                    all_deleted = false;
                }
                Err(e) => {
                    error!("캐시 삭제 실패 ({name}): {e}");
                    all_deleted = false;
                }
            }
        }
        info!("캐시 {}개 삭제 (성공={all_deleted})", names.len());
        all_deleted
    }

    /// 워커 버전 조회
    pub async fn get_version(&self) -> Option<String> {
        match self.host.post_message(WorkerMessage::GetVersion).await {
            Ok(reply) => reply.version,
            Err(e) => {
                debug!("캐시 워커 버전 조회 실패: {e}");
                None
            }
        }
    }

    /// 등록 해제
    pub async fn unregister(&self) -> bool {
        match self.host.unregister().await {
            Ok(removed) => {
                if removed {
                    info!("캐시 워커 등록 해제");
                    self.transition(CacheWorkerState::Unregistered);
                    self.set_status(RegistrationStatus::NotRegistered);
                }
                removed
            }
            Err(e) => {
                error!("캐시 워커 등록 해제 실패: {e}");
                false
            }
        }
    }

    pub fn state(&self) -> CacheWorkerState {
        *self.state.read()
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status.read().clone()
    }

    fn transition(&self, next: CacheWorkerState) {
        let mut state = self.state.write();
        if *state != next {
            debug!("캐시 워커 상태: {} → {next}", *state);
            *state = next;
        }
    }

    fn set_status(&self, status: RegistrationStatus) -> RegistrationStatus {
        *self.status.write() = status.clone();
        status
    }
}
