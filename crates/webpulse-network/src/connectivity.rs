//! 연결 상태 감시.
//!
//! 호스트가 보고하는 온라인/오프라인 전환과 유효 연결 타입을 추적한다.
//! 상태 변경은 `watch` 채널로 구독할 수 있다.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};
use webpulse_core::models::network::{ConnectionInfo, NetworkClass};

/// 연결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Online,
    Offline,
}

impl std::fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectivityStatus::Online => write!(f, "online"),
            ConnectivityStatus::Offline => write!(f, "offline"),
        }
    }
}

/// 연결 상태 감시기
pub struct ConnectivityMonitor {
    is_online: AtomicBool,
    /// 마지막 보고된 연결 정보
    connection: RwLock<Option<ConnectionInfo>>,
    /// 온라인/오프라인 전환 횟수
    transitions: AtomicU64,
    status_tx: watch::Sender<ConnectivityStatus>,
    status_rx: watch::Receiver<ConnectivityStatus>,
}

impl ConnectivityMonitor {
    /// 초기 온라인 여부와 연결 정보로 생성
    pub fn new(online: bool, connection: Option<ConnectionInfo>) -> Self {
        let initial = if online {
            ConnectivityStatus::Online
        } else {
            ConnectivityStatus::Offline
        };
        let (status_tx, status_rx) = watch::channel(initial);
        Self {
            is_online: AtomicBool::new(online),
            connection: RwLock::new(connection),
            transitions: AtomicU64::new(0),
            status_tx,
            status_rx,
        }
    }

    /// 호스트 연결 변경 반영
    ///
    /// 온라인 여부가 바뀌었으면 `true`를 반환한다.
    pub fn update(&self, online: bool, connection: Option<ConnectionInfo>) -> bool {
        if let Some(info) = connection {
            debug!("연결 타입 갱신: {}", info.class());
            *self.connection.write() = Some(info);
        }

        let was_online = self.is_online.swap(online, Ordering::Relaxed);
        if was_online == online {
            return false;
        }

        self.transitions.fetch_add(1, Ordering::Relaxed);
        let status = if online {
            info!("네트워크 연결 복구됨 - 온라인");
            ConnectivityStatus::Online
        } else {
            info!("네트워크 연결 끊김 - 오프라인");
            ConnectivityStatus::Offline
        };
        let _ = self.status_tx.send(status);
        true
    }

    /// 현재 온라인 여부
    pub fn is_online(&self) -> bool {
        self.is_online.load(Ordering::Relaxed)
    }

    /// 현재 상태
    pub fn status(&self) -> ConnectivityStatus {
        *self.status_rx.borrow()
    }

    /// 상태 변경 수신기 생성
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status_rx.clone()
    }

    /// 마지막 연결 정보
    pub fn connection(&self) -> Option<ConnectionInfo> {
        self.connection.read().clone()
    }

    /// 현재 네트워크 등급. 정보가 없으면 Unknown.
    pub fn network_class(&self) -> NetworkClass {
        self.connection
            .read()
            .as_ref()
            .map(ConnectionInfo::class)
            .unwrap_or(NetworkClass::Unknown)
    }

    /// 연결 상태 통계
    pub fn stats(&self) -> ConnectivityStats {
        ConnectivityStats {
            is_online: self.is_online(),
            network_class: self.network_class(),
            transitions: self.transitions.load(Ordering::Relaxed),
        }
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true, None)
    }
}

/// 연결 상태 통계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityStats {
    pub is_online: bool,
    pub network_class: NetworkClass,
    /// 온라인/오프라인 전환 횟수
    pub transitions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_online() {
        let monitor = ConnectivityMonitor::default();
        assert!(monitor.is_online());
        assert_eq!(monitor.status(), ConnectivityStatus::Online);
        assert_eq!(monitor.network_class(), NetworkClass::Unknown);
    }

    #[test]
    fn repeated_state_is_not_a_transition() {
        let monitor = ConnectivityMonitor::default();
        assert!(!monitor.update(true, None));
        assert!(monitor.update(false, None));
        assert!(!monitor.update(false, None));
        assert_eq!(monitor.stats().transitions, 1);
    }

    #[test]
    fn connection_info_updates_class_without_transition() {
        let monitor = ConnectivityMonitor::default();
        assert!(!monitor.update(true, Some(ConnectionInfo::new("3g"))));
        assert_eq!(monitor.network_class(), NetworkClass::ThreeG);

        // 연결 정보 없이 온 변경은 이전 정보를 유지
        monitor.update(false, None);
        assert_eq!(monitor.network_class(), NetworkClass::ThreeG);
    }

    #[tokio::test]
    async fn subscribe_receives_changes() {
        let monitor = ConnectivityMonitor::default();
        let mut rx = monitor.subscribe();

        monitor.update(false, None);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectivityStatus::Offline);

        monitor.update(true, None);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectivityStatus::Online);
    }
}
