//! 세션 모델.
//!
//! 페이지 로드마다 한 번 생성되는 측정 세션과 기기 정보를 표현.

use serde::{Deserialize, Serialize};

use crate::models::network::ConnectionInfo;

/// 기기/환경 정보
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    /// 현재 페이지 URL
    pub url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub connection: Option<ConnectionInfo>,
}

/// 뷰포트 크기 (px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// 측정 세션
///
/// 생성 후에는 `set_user`를 통한 `user_id` 변경 외에는 수정되지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    /// 영속 저장소에 보관되어 세션 간 유지되는 사용자 ID
    pub user_id: String,
    /// 세션 시작 시각 (Unix epoch ms)
    pub started_at: i64,
    pub device_info: DeviceInfo,
}

impl Session {
    /// 세션 경과 시간 (ms)
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.started_at).max(0)
    }
}
