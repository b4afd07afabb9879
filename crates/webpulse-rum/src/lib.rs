//! # webpulse-rum
//!
//! 실사용자 모니터링(RUM) 파이프라인 조립.
//! 샘플링 결정, 세션 생성, 관측 집합과 배처 연결, 에러 추적, 호스트 이벤트 분배를
//! 명시적으로 생성되는 [`RumPipeline`] 하나가 소유한다.

pub mod bootstrap;
pub mod error_tracking;
pub mod sampling;
pub mod session;

pub use bootstrap::{RumHosts, RumPipeline};
pub use sampling::SamplingDecision;
pub use session::{MemoryStore, SessionFactory, USER_ID_KEY};
