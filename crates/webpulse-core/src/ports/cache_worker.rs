//! 캐시 워커 호스트 포트.
//!
//! 오프라인 캐시 워커 등록, 메시지 채널, 캐시 저장소, 백그라운드 동기화를 추상화한다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::cache::{RegistrationSnapshot, WorkerMessage, WorkerReply};

/// 캐시 워커 호스트
#[async_trait]
pub trait CacheWorkerHost: Send + Sync {
    /// 호스트가 캐시 워커를 지원하는지 여부
    fn is_supported(&self) -> bool;

    /// 워커 스크립트 등록
    async fn register(
        &self,
        script_url: &str,
        scope: &str,
    ) -> Result<RegistrationSnapshot, CoreError>;

    /// 새 워커 버전 확인 요청
    async fn update(&self) -> Result<(), CoreError>;

    /// 등록 해제
    async fn unregister(&self) -> Result<bool, CoreError>;

    /// 대기/활성 워커에 명령 전송 후 응답 대기 (MessageChannel 상관)
    async fn post_message(&self, message: WorkerMessage) -> Result<WorkerReply, CoreError>;

    /// 이름 있는 캐시 목록
    async fn cache_names(&self) -> Result<Vec<String>, CoreError>;

    /// 캐시에 저장된 요청 URL 목록
    async fn cache_urls(&self, name: &str) -> Result<Vec<String>, CoreError>;

    /// 캐시 삭제
    async fn delete_cache(&self, name: &str) -> Result<bool, CoreError>;

    /// 백그라운드 동기화 지원 여부
    fn supports_background_sync(&self) -> bool;

    /// 백그라운드 동기화 요청
    async fn register_sync(&self, tag: &str) -> Result<(), CoreError>;

    /// 페이지 전체 새로고침
    fn reload_page(&self);
}
