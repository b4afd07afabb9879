//! 호스트 이벤트 모델.
//!
//! 부트스트랩이 소비하는 호스트 측 이벤트(페이지 로드/언로드, 가시성, 연결 상태,
//! 링크 hover, 요소 노출, 전역 에러)를 정의한다.

use serde::{Deserialize, Serialize};

use crate::models::network::ConnectionInfo;

/// 호스트 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum HostEvent {
    #[serde(rename_all = "camelCase")]
    PageLoad {
        #[serde(default)]
        load_time_ms: Option<f64>,
    },
    PageUnload,
    VisibilityChange { hidden: bool },
    ConnectivityChange {
        online: bool,
        #[serde(default)]
        connection: Option<ConnectionInfo>,
    },
    PointerEnterLink { href: String },
    #[serde(rename_all = "camelCase")]
    ElementVisible { element_id: String },
    UncaughtError {
        message: String,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        line: Option<u32>,
        #[serde(default)]
        column: Option<u32>,
        #[serde(default)]
        stack: Option<String>,
    },
    UnhandledRejection { reason: String },
    RouteChange { path: String },
}
