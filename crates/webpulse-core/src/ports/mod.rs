//! 포트 인터페이스 (trait).
//!
//! 호스트 환경(브라우저, 비브라우저 임베딩, 테스트 목)과의 경계.
//! 코어 로직은 특정 호스트 API에 의존하지 않고 이 trait들만 사용하며,
//! 부트스트랩에서 `Arc<dyn T>`로 와이어링한다.
//!
//! I/O를 수행하는 trait은 `async_trait` 매크로로 object safety를 보장한다.

pub mod cache_worker;
pub mod performance;
pub mod preload_host;
pub mod storage;
pub mod transport;
