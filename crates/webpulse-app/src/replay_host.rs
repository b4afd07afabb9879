//! 리플레이 호스트 어댑터.
//!
//! 기록된 트레이스를 재생할 때 파이프라인에 주입하는 포트 구현:
//! 트레이스 엔트리를 흘려보내는 성능 호스트, HTTP로 리소스를 미리 받아두는 프리로드 호스트,
//! 미지원으로 보고하는 캐시 워커 호스트, JSON 파일 영속 저장소.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use webpulse_core::error::CoreError;
use webpulse_core::models::cache::{RegistrationSnapshot, WorkerMessage, WorkerReply};
use webpulse_core::models::entry::{ObservationCategory, PerformanceEntry};
use webpulse_core::models::network::ConnectionInfo;
use webpulse_core::models::preload::LinkHint;
use webpulse_core::ports::cache_worker::CacheWorkerHost;
use webpulse_core::ports::performance::{EntryCallback, ObserverHandle, PerformanceHost};
use webpulse_core::ports::preload_host::PreloadHost;
use webpulse_core::ports::storage::DurableStore;

type CallbackMap = Arc<Mutex<HashMap<ObservationCategory, EntryCallback>>>;

/// 트레이스 엔트리를 구독자에게 전달하는 성능 호스트
pub struct ReplayPerformanceHost {
    supports: Vec<ObservationCategory>,
    callbacks: CallbackMap,
}

impl ReplayPerformanceHost {
    pub fn new(supports: Vec<ObservationCategory>) -> Self {
        Self {
            supports,
            callbacks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 엔트리를 해당 카테고리 구독자에게 전달. 구독자가 없으면 `false`.
    pub fn dispatch(&self, entry: PerformanceEntry) -> bool {
        let callback = self.callbacks.lock().get(&entry.category()).cloned();
        match callback {
            Some(callback) => {
                callback(entry);
                true
            }
            None => false,
        }
    }
}

struct ReplayObserver {
    category: ObservationCategory,
    callbacks: CallbackMap,
}

impl ObserverHandle for ReplayObserver {
    fn disconnect(&mut self) {
        self.callbacks.lock().remove(&self.category);
    }
}

impl PerformanceHost for ReplayPerformanceHost {
    fn supported_categories(&self) -> Vec<ObservationCategory> {
        self.supports.clone()
    }

    fn observe(
        &self,
        category: ObservationCategory,
        callback: EntryCallback,
    ) -> Result<Box<dyn ObserverHandle>, CoreError> {
        if !self.supports(category) {
            return Err(CoreError::NotSupported(category.to_string()));
        }
        self.callbacks.lock().insert(category, callback);
        Ok(Box::new(ReplayObserver {
            category,
            callbacks: Arc::clone(&self.callbacks),
        }))
    }
}

/// 프리로드 힌트를 HTTP GET으로 재현하는 호스트
///
/// origin이 없으면 힌트를 기록만 하고 성공으로 처리한다.
pub struct ReplayPreloadHost {
    warm: Option<(reqwest::Client, Url)>,
    connection: Option<ConnectionInfo>,
}

impl ReplayPreloadHost {
    pub fn new(
        origin: Option<&str>,
        connection: Option<ConnectionInfo>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let warm = match origin {
            Some(origin) => {
                let base = Url::parse(origin)
                    .map_err(|e| CoreError::Config(format!("잘못된 origin '{origin}': {e}")))?;
                let client = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;
                Some((client, base))
            }
            None => None,
        };
        Ok(Self { warm, connection })
    }
}

#[async_trait]
impl PreloadHost for ReplayPreloadHost {
    async fn load_hint(&self, hint: &LinkHint) -> Result<(), CoreError> {
        let Some((client, base)) = &self.warm else {
            debug!("프리로드 힌트 (네트워크 없음): {} {}", hint.rel.as_str(), hint.href);
            return Ok(());
        };

        let url = base
            .join(&hint.href)
            .map_err(|e| CoreError::Config(format!("힌트 URL 해석 실패 '{}': {e}", hint.href)))?;
        let resp = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("프리로드 요청 실패: {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Network(format!(
                "프리로드 응답 오류 ({status}): {url}"
            )));
        }
        debug!("프리로드 완료: {} {url}", hint.rel.as_str());
        Ok(())
    }

    fn connection_info(&self) -> Option<ConnectionInfo> {
        self.connection.clone()
    }
}

/// 캐시 워커가 없는 호스트
pub struct NoCacheWorker;

fn unsupported() -> CoreError {
    CoreError::NotSupported("cache worker".to_string())
}

#[async_trait]
impl CacheWorkerHost for NoCacheWorker {
    fn is_supported(&self) -> bool {
        false
    }

    async fn register(
        &self,
        _script_url: &str,
        _scope: &str,
    ) -> Result<RegistrationSnapshot, CoreError> {
        Err(unsupported())
    }

    async fn update(&self) -> Result<(), CoreError> {
        Err(unsupported())
    }

    async fn unregister(&self) -> Result<bool, CoreError> {
        Err(unsupported())
    }

    async fn post_message(&self, _message: WorkerMessage) -> Result<WorkerReply, CoreError> {
        Err(unsupported())
    }

    async fn cache_names(&self) -> Result<Vec<String>, CoreError> {
        Err(unsupported())
    }

    async fn cache_urls(&self, _name: &str) -> Result<Vec<String>, CoreError> {
        Err(unsupported())
    }

    async fn delete_cache(&self, _name: &str) -> Result<bool, CoreError> {
        Err(unsupported())
    }

    fn supports_background_sync(&self) -> bool {
        false
    }

    async fn register_sync(&self, _tag: &str) -> Result<(), CoreError> {
        Err(unsupported())
    }

    fn reload_page(&self) {}
}

/// JSON 파일 기반 영속 저장소
pub struct FileStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// 파일을 열어 로드. 파일이 없으면 빈 저장소로 시작한다.
    pub fn open(path: PathBuf) -> Result<Self, CoreError> {
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };
        info!("영속 저장소: {}", path.display());
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
