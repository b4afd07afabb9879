//! 세션 샘플링 결정.
//!
//! 파이프라인 생성 시 한 번만 결정한다. 이벤트마다 다시 굴리지 않는다.

/// 샘플링 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingDecision {
    Sampled,
    NotSampled,
}

impl SamplingDecision {
    /// `[0, 1)` 구간의 난수 `roll`로 결정
    pub fn from_roll(rate: f64, roll: f64) -> Self {
        if roll < rate {
            SamplingDecision::Sampled
        } else {
            SamplingDecision::NotSampled
        }
    }

    /// 비율에 따라 무작위 결정
    pub fn decide(rate: f64) -> Self {
        Self::from_roll(rate, rand::random::<f64>())
    }

    pub fn is_sampled(&self) -> bool {
        matches!(self, SamplingDecision::Sampled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_never_samples() {
        for roll in [0.0, 0.05, 0.5, 0.999] {
            assert_eq!(SamplingDecision::from_roll(0.0, roll), SamplingDecision::NotSampled);
        }
        assert!(!SamplingDecision::decide(0.0).is_sampled());
    }

    #[test]
    fn full_rate_always_samples() {
        for roll in [0.0, 0.5, 0.999_999] {
            assert!(SamplingDecision::from_roll(1.0, roll).is_sampled());
        }
        assert!(SamplingDecision::decide(1.0).is_sampled());
    }

    #[test]
    fn roll_below_rate_is_sampled() {
        assert!(SamplingDecision::from_roll(0.1, 0.09).is_sampled());
        assert!(!SamplingDecision::from_roll(0.1, 0.1).is_sampled());
    }
}
