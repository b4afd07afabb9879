//! WebPulse 도메인 모델.
//!
//! 파이프라인 컴포넌트 간에 공유하는 데이터 구조체를 정의한다.
//! 와이어/트레이스에 나가는 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod cache;
pub mod entry;
pub mod envelope;
pub mod host_event;
pub mod metric;
pub mod network;
pub mod preload;
pub mod session;
