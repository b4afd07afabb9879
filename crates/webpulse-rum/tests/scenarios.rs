//! 파이프라인 전체 조립 시나리오 테스트.

mod common;

use assert_matches::assert_matches;
use common::{harness_with, sampled, settle};
use serde_json::Map;
use std::sync::atomic::Ordering;
use std::time::Duration;
use webpulse_core::config::AppConfig;
use webpulse_core::event_bus::PipelineEvent;
use webpulse_core::models::cache::RegistrationStatus;
use webpulse_core::models::entry::{PerformanceEntry, ResourceTiming};
use webpulse_core::models::envelope::Envelope;
use webpulse_core::models::host_event::HostEvent;
use webpulse_core::models::metric::Rating;
use webpulse_core::models::network::ConnectionInfo;
use webpulse_rum::SamplingDecision;

fn lcp(start_time: f64) -> PerformanceEntry {
    PerformanceEntry::LargestContentfulPaint {
        start_time,
        size: Some(48_000),
        element: Some("img.hero".into()),
        url: None,
    }
}

fn has_lcp(batch: &[Envelope]) -> bool {
    batch
        .iter()
        .any(|e| matches!(e, Envelope::Metric { name, .. } if name == "LCP"))
}

fn long_task(start_time: f64, duration: f64) -> PerformanceEntry {
    PerformanceEntry::LongTask {
        start_time,
        duration,
        attribution: None,
    }
}

#[tokio::test]
async fn long_tasks_accumulate_blocking_time() {
    let h = sampled();
    h.pipeline.start().await;

    h.performance.emit(long_task(100.0, 80.0));
    h.performance.emit(long_task(300.0, 30.0));
    h.performance.emit(long_task(500.0, 120.0));

    let summary = h.pipeline.summary().unwrap();
    assert_eq!(summary.long_task_count, 3);
    assert_eq!(summary.total_blocking_time, 100.0);
}

#[tokio::test]
async fn lcp_metric_reaches_the_batch() {
    let h = sampled();
    h.pipeline.start().await;

    h.performance.emit(PerformanceEntry::LargestContentfulPaint {
        start_time: 3000.0,
        size: Some(48_000),
        element: Some("img.hero".into()),
        url: None,
    });

    let lcp = h.pipeline.summary().unwrap().lcp.unwrap();
    assert_eq!(lcp.value, 3000.0);
    assert_eq!(lcp.rating, Some(Rating::NeedsImprovement));

    h.pipeline.shutdown().await;
    let sent = h.transport.sent.lock();
    assert_eq!(sent.len(), 1);
    let metric = sent[0]
        .batch
        .iter()
        .find(|e| matches!(e, Envelope::Metric { name, .. } if name == "LCP"));
    assert_matches!(
        metric,
        Some(Envelope::Metric {
            rating: Some(Rating::NeedsImprovement),
            ..
        })
    );
}

#[tokio::test]
async fn lcp_observed_right_before_unload_is_in_the_beacon() {
    let h = sampled();
    h.pipeline.start().await;

    h.performance.emit(lcp(3000.0));
    h.pipeline.handle(HostEvent::PageUnload).await;

    let beacons = h.transport.beacons.lock();
    assert_eq!(beacons.len(), 1);
    assert!(has_lcp(&beacons[0].batch));
    assert_eq!(h.pipeline.batch_stats().unwrap().queued, 0);
}

#[tokio::test]
async fn lcp_observed_right_before_shutdown_is_sent() {
    let h = sampled();
    h.pipeline.start().await;

    h.performance.emit(lcp(1800.0));
    h.pipeline.shutdown().await;

    let sent = h.transport.sent.lock();
    assert_eq!(sent.len(), 1);
    assert!(has_lcp(&sent[0].batch));
}

#[tokio::test]
async fn resource_burst_is_batched_without_loss() {
    let h = sampled();
    h.pipeline.start().await;

    // 이벤트 버스 용량(256)을 넘는 버퍼링된 엔트리를 한 번에 전달
    for i in 0..300 {
        h.performance.emit(PerformanceEntry::Resource(ResourceTiming {
            name: format!("/static/img/tile-{i}.png"),
            initiator_type: "img".into(),
            start_time: i as f64,
            duration: 12.0,
            transfer_size: 2_048,
            decoded_body_size: 2_048,
        }));
    }
    settle().await;

    let stats = h.pipeline.batch_stats().unwrap();
    assert_eq!(stats.sent + stats.queued as u64, 300);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.flushes, 6);
}

#[tokio::test]
async fn slow_network_limits_preloading() {
    let h = harness_with(
        AppConfig::default_config(),
        Some("2g"),
        Some(SamplingDecision::Sampled),
    );
    h.pipeline.start().await;
    settle().await;

    assert_eq!(h.pipeline.preloader().stats().max_concurrent, 1);
    assert!(h.preload.loads.lock().is_empty());
}

#[tokio::test]
async fn fast_network_preloads_likely_next_routes() {
    let h = harness_with(
        AppConfig::default_config(),
        Some("4g"),
        Some(SamplingDecision::Sampled),
    );
    h.pipeline.start().await;
    settle().await;

    assert_eq!(h.pipeline.preloader().stats().max_concurrent, 4);
    assert!(!h.preload.loads.lock().is_empty());
}

#[tokio::test]
async fn zero_sample_rate_disables_telemetry() {
    let mut config = AppConfig::default_config();
    config.telemetry.sample_rate = 0.0;
    let h = harness_with(config, None, None);
    assert!(!h.pipeline.is_sampled());

    h.pipeline.start().await;
    h.performance.emit(long_task(0.0, 400.0));
    h.pipeline
        .handle(HostEvent::PageLoad {
            load_time_ms: Some(1200.0),
        })
        .await;
    h.pipeline
        .handle(HostEvent::UncaughtError {
            message: "boom".into(),
            source: None,
            line: None,
            column: None,
            stack: None,
        })
        .await;
    h.pipeline.handle(HostEvent::PageUnload).await;
    h.pipeline.shutdown().await;

    assert_eq!(h.performance.observe_calls(), 0);
    assert_eq!(h.transport.network_calls(), 0);
}

#[tokio::test]
async fn full_batch_flushes_exactly_once() {
    let mut config = AppConfig::default_config();
    config.telemetry.max_batch_size = 3;
    let h = harness_with(config, None, Some(SamplingDecision::Sampled));

    for name in ["a", "b", "c"] {
        h.pipeline.track_event(name, Map::new());
    }
    settle().await;

    let sent = h.transport.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].batch.len(), 3);
    assert_eq!(h.pipeline.batch_stats().unwrap().queued, 0);
}

#[tokio::test]
async fn unload_uses_beacon_without_waiting() {
    let h = sampled();
    h.transport.hang.store(true, Ordering::SeqCst);
    h.pipeline.track_event("cta_click", Map::new());

    // 일반 전송이 멈춰 있어도 언로드 처리는 바로 끝나야 한다
    tokio::time::timeout(
        Duration::from_secs(1),
        h.pipeline.handle(HostEvent::PageUnload),
    )
    .await
    .expect("unload flush must not wait");

    let beacons = h.transport.beacons.lock();
    assert_eq!(beacons.len(), 1);
    let last = beacons[0].batch.last().unwrap();
    assert_matches!(
        last,
        Envelope::Interaction { name, data, .. }
            if name == "engagement" && data.contains_key("timeOnPage")
    );
    assert!(h.transport.sent.lock().is_empty());
}

#[tokio::test]
async fn unsupported_cache_worker_is_reported() {
    let h = sampled();
    h.pipeline.start().await;

    assert_eq!(h.pipeline.cache().status(), RegistrationStatus::NotSupported);
}

#[tokio::test]
async fn connectivity_transitions_are_published() {
    let h = sampled();
    let mut rx = h.bus.subscribe();

    h.pipeline
        .handle(HostEvent::ConnectivityChange {
            online: false,
            connection: None,
        })
        .await;
    h.pipeline
        .handle(HostEvent::ConnectivityChange {
            online: true,
            connection: Some(ConnectionInfo::new("3g")),
        })
        .await;

    assert_eq!(rx.recv().await.unwrap(), PipelineEvent::AppOffline);
    assert_eq!(rx.recv().await.unwrap(), PipelineEvent::AppOnline);
    assert_eq!(h.pipeline.preloader().stats().max_concurrent, 2);
    assert_eq!(h.pipeline.connectivity().stats().transitions, 2);
}

#[tokio::test]
async fn uncaught_error_is_batched() {
    let h = sampled();
    h.pipeline
        .handle(HostEvent::UnhandledRejection {
            reason: "network timeout".into(),
        })
        .await;
    h.pipeline.shutdown().await;

    let sent = h.transport.sent.lock();
    assert_matches!(
        &sent[0].batch[0],
        Envelope::Error { message, .. } if message == "Unhandled Promise Rejection: network timeout"
    );
}

#[tokio::test(start_paused = true)]
async fn observers_stop_after_page_load_grace() {
    let h = sampled();
    h.pipeline.start().await;
    let observers = h.pipeline.observers().unwrap();
    assert!(observers.active_subscriptions() > 0);

    h.pipeline
        .handle(HostEvent::PageLoad { load_time_ms: None })
        .await;
    tokio::time::sleep(Duration::from_secs(9)).await;
    assert!(observers.active_subscriptions() > 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(observers.active_subscriptions(), 0);
    assert!(h.performance.disconnects.load(Ordering::SeqCst) > 0);
}
