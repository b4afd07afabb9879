//! # webpulse-monitor
//!
//! 호스트 성능 신호를 구독하고 각 엔트리를 등급이 매겨진 [`Metric`]으로 분류한다.
//!
//! - [`observer`]: `MetricObserverSet`, capability 확인 후 구독, 조회, 요약, 로드 후 자동 중단
//! - [`layout_shift`]: CLS 세션 윈도우 누적기
//! - [`classify`]: 내비게이션 단계 분해, 리소스 분류, 블로킹 시간 계산
//!
//! [`Metric`]: webpulse_core::models::metric::Metric

pub mod classify;
pub mod layout_shift;
pub mod observer;

pub use observer::{MetricObserverSet, MetricSink, VitalsSummary};
