//! 라우트 인접 테이블.

use std::collections::HashMap;
use webpulse_core::config::RouteEntry;

/// 경로 → 라우트 정보 조회 테이블
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteEntry>,
}

/// 끝의 `/` 제거 (루트 제외)
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        let routes = entries
            .into_iter()
            .map(|entry| (normalize_path(&entry.path).to_string(), entry))
            .collect();
        Self { routes }
    }

    pub fn get(&self, path: &str) -> Option<&RouteEntry> {
        self.routes.get(normalize_path(path))
    }

    /// `path`에서 이동할 가능성이 높은 라우트 상위 `limit`개
    ///
    /// 테이블에 없는 다음 경로는 건너뛴다.
    pub fn likely_next(&self, path: &str, limit: usize) -> Vec<&RouteEntry> {
        let Some(current) = self.get(path) else {
            return Vec::new();
        };
        current
            .next
            .iter()
            .filter_map(|next| self.get(next))
            .take(limit)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
