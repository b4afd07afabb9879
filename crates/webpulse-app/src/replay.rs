//! 트레이스 리플레이 구동.
//!
//! 트레이스 단계를 기록된 시각 간격대로 파이프라인에 흘려보내고 결과 보고서를 만든다.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use webpulse_core::models::cache::RegistrationStatus;
use webpulse_monitor::VitalsSummary;
use webpulse_network::BatchStats;
use webpulse_preload::PreloadStats;
use webpulse_rum::RumPipeline;

use crate::replay_host::ReplayPerformanceHost;
use crate::trace::{Trace, TraceStep};

/// 재생 단계 집계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayCounts {
    /// 구독자에게 전달된 엔트리
    pub entries_delivered: usize,
    /// 구독자가 없어 버려진 엔트리
    pub entries_ignored: usize,
    pub events: usize,
}

/// 리플레이 결과 보고서
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub sampled: bool,
    pub session_id: Option<String>,
    pub counts: ReplayCounts,
    pub vitals: Option<VitalsSummary>,
    pub batch: Option<BatchStats>,
    pub preload: PreloadStats,
    pub cache: RegistrationStatus,
}

/// 트레이스 단계 재생
///
/// `instant`이면 단계 사이 대기 없이 바로 진행한다.
pub async fn drive(
    pipeline: &RumPipeline,
    performance: &ReplayPerformanceHost,
    trace: &Trace,
    instant: bool,
) -> ReplayCounts {
    let mut counts = ReplayCounts::default();
    let mut clock_ms = 0u64;

    for step in &trace.steps {
        let at_ms = step.at_ms();
        if !instant && at_ms > clock_ms {
            tokio::time::sleep(Duration::from_millis(at_ms - clock_ms)).await;
        }
        clock_ms = clock_ms.max(at_ms);

        match step {
            TraceStep::Entry { entry, .. } => {
                if performance.dispatch(entry.clone()) {
                    counts.entries_delivered += 1;
                } else {
                    debug!("{at_ms}ms: 구독자 없는 엔트리 ({})", entry.category());
                    counts.entries_ignored += 1;
                }
            }
            TraceStep::Event { event, .. } => {
                debug!("{at_ms}ms: 호스트 이벤트 {event:?}");
                pipeline.handle(event.clone()).await;
                counts.events += 1;
            }
        }
    }

    info!(
        "트레이스 재생 완료: 엔트리 {}개 전달, {}개 무시, 이벤트 {}개",
        counts.entries_delivered, counts.entries_ignored, counts.events
    );
    counts
}

/// 종료된 파이프라인 상태로 보고서 작성
pub fn report(pipeline: &RumPipeline, counts: ReplayCounts) -> ReplayReport {
    ReplayReport {
        sampled: pipeline.is_sampled(),
        session_id: pipeline.session().map(|s| s.session_id),
        counts,
        vitals: pipeline.summary(),
        batch: pipeline.batch_stats(),
        preload: pipeline.preloader().stats(),
        cache: pipeline.cache().status(),
    }
}
