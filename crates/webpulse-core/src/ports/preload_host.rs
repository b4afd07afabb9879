//! 프리로드 호스트 포트.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::network::ConnectionInfo;
use crate::models::preload::LinkHint;

/// 링크 힌트 삽입 및 네트워크 정보 제공
#[async_trait]
pub trait PreloadHost: Send + Sync {
    /// 힌트를 삽입하고 로드 완료(또는 실패)까지 대기
    async fn load_hint(&self, hint: &LinkHint) -> Result<(), CoreError>;

    /// 현재 연결 정보. 호스트가 제공하지 않으면 None.
    fn connection_info(&self) -> Option<ConnectionInfo>;
}
