//! CLS 세션 윈도우 누적기.
//!
//! 최근 사용자 입력이 없는 레이아웃 이동을 세션 단위로 합산한다.
//! 새 엔트리는 직전 엔트리로부터 1초 미만, 세션 첫 엔트리로부터 5초 미만일 때만
//! 현재 세션에 합류하고, 그렇지 않으면 새 세션을 시작한다.
//! 보고되는 CLS는 누적 총합이 아니라 지금까지 관측된 세션 합의 최댓값이다.

/// 세션 내 엔트리 간 최대 간격 (ms)
pub const SESSION_GAP_MS: f64 = 1_000.0;
/// 세션 최대 길이 (ms)
pub const SESSION_MAX_MS: f64 = 5_000.0;

#[derive(Debug, Clone, Default)]
pub struct LayoutShiftWindow {
    session_value: f64,
    session_first: f64,
    session_last: f64,
    session_count: u32,
    max_value: f64,
}

impl LayoutShiftWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 레이아웃 이동 하나를 반영하고 현재 CLS를 반환.
    ///
    /// `had_recent_input`인 엔트리는 무시된다.
    pub fn record(&mut self, start_time: f64, value: f64, had_recent_input: bool) -> f64 {
        if had_recent_input {
            return self.max_value;
        }

        let joins_session = self.session_count > 0
            && start_time - self.session_last < SESSION_GAP_MS
            && start_time - self.session_first < SESSION_MAX_MS;

        if joins_session {
            self.session_value += value;
        } else {
            self.session_value = value;
            self.session_first = start_time;
            self.session_count += 1;
        }
        self.session_last = start_time;

        if self.session_value > self.max_value {
            self.max_value = self.session_value;
        }
        self.max_value
    }

    /// 현재 CLS (최대 세션 합)
    pub fn value(&self) -> f64 {
        self.max_value
    }

    /// 진행 중인 세션 합
    pub fn current_session_value(&self) -> f64 {
        self.session_value
    }

    /// 지금까지 시작된 세션 수
    pub fn session_count(&self) -> u32 {
        self.session_count
    }
}
