//! # webpulse-network
//!
//! 텔레메트리 전달 경로.
//! 봉투를 배치로 모아 주기/크기/해체 시점에 전송하고,
//! `TelemetryTransport` 포트의 reqwest 구현과 연결 상태 감시를 제공한다.

pub mod batcher;
pub mod connectivity;
pub mod http_transport;

pub use batcher::{BatchStats, TelemetryBatcher};
pub use connectivity::{ConnectivityMonitor, ConnectivityStatus};
pub use http_transport::HttpTelemetryTransport;
