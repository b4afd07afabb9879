//! 세션 생성.
//!
//! 세션 ID는 페이지 로드마다 새로 만들고, 사용자 ID는 영속 저장소에 보관해 재사용한다.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;
use webpulse_core::error::CoreError;
use webpulse_core::models::envelope::now_millis;
use webpulse_core::models::session::{DeviceInfo, Session};
use webpulse_core::ports::storage::DurableStore;

/// 사용자 ID 저장 키
pub const USER_ID_KEY: &str = "webpulse_user_id";

/// 세션 팩토리
pub struct SessionFactory {
    store: Arc<dyn DurableStore>,
}

impl SessionFactory {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }

    /// 저장된 사용자 ID. 없으면 새로 만들어 저장한다.
    pub fn user_id(&self) -> String {
        if let Some(existing) = self.store.get(USER_ID_KEY).filter(|v| !v.is_empty()) {
            return existing;
        }

        let created = format!("user_{}", Uuid::new_v4().simple());
        if let Err(e) = self.store.set(USER_ID_KEY, &created) {
            // 저장 실패 시 이번 세션에만 유효한 ID로 계속
            warn!("사용자 ID 저장 실패: {e}");
        }
        debug!("새 사용자 ID 생성: {created}");
        created
    }

    /// 사용자 ID 교체 후 저장
    pub fn persist_user(&self, user_id: &str) -> Result<(), CoreError> {
        self.store.set(USER_ID_KEY, user_id)
    }

    /// 새 세션 생성
    pub fn create(&self, device_info: DeviceInfo) -> Session {
        Session {
            session_id: format!("session_{}", Uuid::new_v4().simple()),
            user_id: self.user_id(),
            started_at: now_millis(),
            device_info,
        }
    }
}

/// 메모리 저장소 (테스트/리플레이용)
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
