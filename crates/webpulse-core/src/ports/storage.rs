//! 영속 저장소 포트.
//!
//! 세션을 넘어 유지되어야 하는 값(사용자 ID)을 보관한다.

use crate::error::CoreError;

/// 키-값 영속 저장소 (localStorage 등)
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
}
