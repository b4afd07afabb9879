//! # webpulse-core
//!
//! 성능/텔레메트리 파이프라인 공용 타입.
//! 호스트(브라우저 등)와 맞닿는 경계는 전부 `ports`의 trait으로 표현하고,
//! 나머지 크레이트는 이 타입들만 주고받는다.
//!
//! ## 구성
//!
//! - [`models`]: 지표, 봉투, 세션, 원시 성능 엔트리, 프리로드 작업, 캐시 워커 상태
//! - [`ports`]: 성능 관측, 텔레메트리 전송, 프리로드, 캐시 워커, 영속 저장소
//! - [`error`]: `CoreError`
//! - [`config`] / [`config_manager`]: 설정 구조체와 JSON 설정 파일
//! - [`event_bus`]: `PipelineEvent` broadcast 버스

pub mod config;
pub mod config_manager;
pub mod error;
pub mod event_bus;
pub mod models;
pub mod ports;
