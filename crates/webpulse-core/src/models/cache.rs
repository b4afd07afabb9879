//! 오프라인 캐시 워커 모델.
//!
//! 워커 상태 머신, 등록 상태, 캐시 조회 결과, 워커 메시지를 정의한다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 캐시 워커 상태
///
/// 전이는 단조 증가한다. 단, 업데이트 시에는 `Active` → 새 `Installing`으로 되돌아간다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheWorkerState {
    Unregistered,
    Installing,
    Waiting,
    Active,
}

impl fmt::Display for CacheWorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheWorkerState::Unregistered => "unregistered",
            CacheWorkerState::Installing => "installing",
            CacheWorkerState::Waiting => "waiting",
            CacheWorkerState::Active => "active",
        };
        f.write_str(s)
    }
}

/// 등록 상태 (호출자 보고용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationStatus {
    /// 호스트가 캐시 워커를 지원하지 않음
    NotSupported,
    /// 등록 시도 전이거나 등록 실패
    NotRegistered,
    /// 등록 완료
    Registered { scope: String },
}

/// 호스트 등록 직후 스냅샷
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSnapshot {
    /// 등록 범위
    pub scope: String,
    /// 페이지를 이미 제어 중인 워커 존재 여부
    pub has_controller: bool,
    /// 설치 중인 워커 존재 여부
    pub installing: bool,
    /// 대기 중인 워커 존재 여부
    pub waiting: bool,
    /// 활성 워커 존재 여부
    pub active: bool,
}

/// 호스트가 보고하는 워커 단계 변화
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerPhase {
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// 워커로 보내는 명령 (MessageChannel)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    SkipWaiting,
    GetVersion,
}

/// 워커 응답
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerReply {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub ok: bool,
}

/// 이름 있는 캐시 하나의 조회 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub name: String,
    pub entry_count: usize,
    pub urls: Vec<String>,
}
