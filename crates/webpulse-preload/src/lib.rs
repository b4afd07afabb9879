//! # webpulse-preload
//!
//! 필요해지기 전에 자산과 라우트 번들의 프리로드 힌트를 발행한다.
//! 동시 진행 수를 연결 등급에 맞춰 제한하고, 같은 URL은 한 번만 요청한다.

pub mod routes;
pub mod scheduler;

pub use routes::RouteTable;
pub use scheduler::{PreloadOutcome, PreloadStats, ResourcePreloadScheduler};
