//! 성능 관측 포트.
//!
//! 호스트의 성능 관측 기본 요소를 추상화한다. 지원 여부 협상(capability probe)과
//! 카테고리별 구독을 제공한다.

use std::sync::Arc;

use crate::error::CoreError;
use crate::models::entry::{ObservationCategory, PerformanceEntry};

/// 엔트리 수신 콜백. 호스트가 임의 시점에 호출한다.
pub type EntryCallback = Arc<dyn Fn(PerformanceEntry) + Send + Sync>;

/// 활성 구독 핸들
pub trait ObserverHandle: Send {
    /// 구독 해제. 여러 번 호출해도 안전해야 한다.
    fn disconnect(&mut self);
}

/// 성능 관측 호스트
pub trait PerformanceHost: Send + Sync {
    /// 현재 호스트에서 관측 가능한 카테고리 목록
    fn supported_categories(&self) -> Vec<ObservationCategory>;

    /// 카테고리 지원 여부
    fn supports(&self, category: ObservationCategory) -> bool {
        self.supported_categories().contains(&category)
    }

    /// 카테고리 구독. 버퍼된 과거 엔트리도 전달할 수 있다.
    fn observe(
        &self,
        category: ObservationCategory,
        callback: EntryCallback,
    ) -> Result<Box<dyn ObserverHandle>, CoreError>;
}
