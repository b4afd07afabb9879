//! # webpulse-cache
//!
//! 오프라인 캐시 워커의 등록과 버전 전환을 감독한다.
//! 업데이트 대기/최초 설치/온라인·오프라인 신호를 이벤트 버스로 내보낸다.

pub mod lifecycle;

pub use lifecycle::CacheLifecycleManager;
