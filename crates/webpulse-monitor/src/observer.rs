//! 성능 지표 관측 집합.
//!
//! 호스트가 지원하는 카테고리만 구독하고(미지원은 조용히 건너뜀), 들어오는 원시 엔트리를
//! [`Metric`]으로 분류해 보관한다. 분류된 지표는 싱크(배처)로 즉시 넘기고
//! 외부 구독자를 위해 이벤트 버스로도 브로드캐스트한다.
//! 페이지 로드 후 유예 시간이 지나면 구독을 자동 해제해 장수 탭의 메모리 증가를 막는다.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use webpulse_core::event_bus::{EventBus, PipelineEvent};
use webpulse_core::models::entry::{ObservationCategory, PerformanceEntry};
use webpulse_core::models::metric::{Metric, MetricName};
use webpulse_core::ports::performance::{EntryCallback, ObserverHandle, PerformanceHost};

use crate::classify::{self, NavigationPhases, ResourceClass};
use crate::layout_shift::LayoutShiftWindow;

/// 지표 이름별 최대 보관 개수 (초과 시 오래된 것부터 버림)
const MAX_SAMPLES_PER_METRIC: usize = 500;

/// 분류된 지표를 받는 동기 싱크. 엔트리 콜백 안에서 곧바로 호출된다.
pub type MetricSink = Arc<dyn Fn(&Metric) + Send + Sync>;

/// Core Web Vitals 요약
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsSummary {
    pub lcp: Option<Metric>,
    pub fid: Option<Metric>,
    pub cls: Option<Metric>,
    pub ttfb: Option<Metric>,
    pub long_task_count: u64,
    /// 롱태스크별 블로킹 기여분 합 (ms)
    pub total_blocking_time: f64,
}

#[derive(Default)]
struct ObserverState {
    metrics: HashMap<MetricName, VecDeque<Metric>>,
    cls: LayoutShiftWindow,
    long_task_count: u64,
    total_blocking_time: f64,
}

impl ObserverState {
    fn push(&mut self, metric: Metric) {
        let samples = self.metrics.entry(metric.name.clone()).or_default();
        if samples.len() >= MAX_SAMPLES_PER_METRIC {
            samples.pop_front();
        }
        samples.push_back(metric);
    }

    /// 이전 후보를 대체 (LCP, CLS, TTFB, navigation). 최신 값 하나만 남는다.
    fn replace(&mut self, metric: Metric) {
        self.metrics.insert(metric.name.clone(), VecDeque::from([metric]));
    }

    fn latest(&self, name: &MetricName) -> Option<Metric> {
        self.metrics.get(name).and_then(|v| v.back().cloned())
    }
}

/// 엔트리 → 지표 분류기. 호스트 콜백은 `Weak` 참조로 이 구조체에 접근한다.
struct Recorder {
    state: Mutex<ObserverState>,
    bus: EventBus,
    sink: Option<MetricSink>,
}

impl Recorder {
    fn record(&self, entry: PerformanceEntry) -> Vec<Metric> {
        let produced = {
            let mut state = self.state.lock();
            classify_entry(&mut state, entry)
        };

        // 싱크와 브로드캐스트는 락 밖에서 (재진입 허용)
        for metric in &produced {
            if let Some(sink) = &self.sink {
                sink(metric);
            }
            self.bus.publish(PipelineEvent::MetricObserved(metric.clone()));
        }
        produced
    }
}

fn classify_entry(state: &mut ObserverState, entry: PerformanceEntry) -> Vec<Metric> {
    match entry {
        PerformanceEntry::LargestContentfulPaint {
            start_time,
            size,
            element,
            url,
        } => {
            let mut metric = Metric::rated(MetricName::Lcp, start_time);
            if let Some(size) = size {
                metric = metric.with_attr("size", size);
            }
            if let Some(element) = element {
                metric = metric.with_attr("element", element);
            }
            if let Some(url) = url {
                metric = metric.with_attr("url", url);
            }
            state.replace(metric.clone());
            vec![metric]
        }
        PerformanceEntry::FirstInput {
            name,
            start_time,
            processing_start,
        } => {
            let delay = (processing_start - start_time).max(0.0);
            let metric = Metric::rated(MetricName::Fid, delay).with_attr("eventType", name);
            state.push(metric.clone());
            vec![metric]
        }
        PerformanceEntry::LayoutShift {
            start_time,
            value,
            had_recent_input,
        } => {
            if had_recent_input {
                return Vec::new();
            }
            let cls = state.cls.record(start_time, value, false);
            let metric = Metric::rated(MetricName::Cls, cls)
                .with_attr("sessionValue", state.cls.current_session_value())
                .with_attr("sessionCount", state.cls.session_count());
            state.replace(metric.clone());
            vec![metric]
        }
        PerformanceEntry::LongTask {
            start_time,
            duration,
            attribution,
        } => {
            let blocking = classify::blocking_time(duration);
            state.long_task_count += 1;
            state.total_blocking_time += blocking;
            let metric = Metric::rated(MetricName::LongTask, duration)
                .with_attr("startTime", start_time)
                .with_attr("blockingTime", blocking)
                .with_attr(
                    "attribution",
                    attribution.unwrap_or_else(|| "unknown".to_string()),
                );
            state.push(metric.clone());
            vec![metric]
        }
        PerformanceEntry::Navigation(timing) => {
            let phases = NavigationPhases::from_timing(&timing);
            let ttfb = Metric::rated(MetricName::Ttfb, classify::time_to_first_byte(&timing));
            let mut navigation = Metric::rated(MetricName::Navigation, phases.total);
            if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(phases) {
                navigation.attributes = map;
            }
            state.replace(ttfb.clone());
            state.replace(navigation.clone());
            vec![ttfb, navigation]
        }
        PerformanceEntry::Resource(resource) => {
            let class = ResourceClass::from_url(&resource.name);
            let metric = Metric::rated(MetricName::Resource, resource.duration)
                .with_attr("cached", classify::is_cached(&resource))
                .with_attr("resourceType", class.as_str())
                .with_attr("transferSize", resource.transfer_size)
                .with_attr("initiatorType", resource.initiator_type)
                .with_attr("url", resource.name);
            state.push(metric.clone());
            vec![metric]
        }
        PerformanceEntry::Measure {
            name,
            start_time,
            duration,
        } => {
            let metric =
                Metric::rated(MetricName::Custom(name), duration).with_attr("startTime", start_time);
            state.push(metric.clone());
            vec![metric]
        }
    }
}

struct Inner {
    host: Arc<dyn PerformanceHost>,
    recorder: Arc<Recorder>,
    handles: Mutex<Vec<(ObservationCategory, Box<dyn ObserverHandle>)>>,
    stop_task: Mutex<Option<JoinHandle<()>>>,
}

/// 성능 지표 관측 집합. 복제본은 같은 상태를 공유한다.
#[derive(Clone)]
pub struct MetricObserverSet {
    inner: Arc<Inner>,
}

impl MetricObserverSet {
    /// 새 관측 집합 생성 (구독은 `observe` 호출 시)
    pub fn new(host: Arc<dyn PerformanceHost>, bus: EventBus) -> Self {
        Self::build(host, bus, None)
    }

    /// 분류된 지표를 엔트리 콜백 안에서 `sink`로 바로 넘기는 관측 집합
    ///
    /// 버스 구독자와 달리 싱크는 지표를 놓치지 않는다.
    pub fn with_sink(host: Arc<dyn PerformanceHost>, bus: EventBus, sink: MetricSink) -> Self {
        Self::build(host, bus, Some(sink))
    }

    fn build(host: Arc<dyn PerformanceHost>, bus: EventBus, sink: Option<MetricSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                recorder: Arc::new(Recorder {
                    state: Mutex::new(ObserverState::default()),
                    bus,
                    sink,
                }),
                handles: Mutex::new(Vec::new()),
                stop_task: Mutex::new(None),
            }),
        }
    }

    /// 카테고리 하나 구독
    ///
    /// 호스트가 지원하지 않으면 에러 없이 건너뛰고 `false`를 반환한다.
    /// 이미 구독 중이면 `true`.
    pub fn observe(&self, category: ObservationCategory) -> bool {
        if self.is_observing(category) {
            return true;
        }

        if !self.inner.host.supports(category) {
            debug!("관측 카테고리 미지원, 건너뜀: {category}");
            return false;
        }

        let weak: Weak<Recorder> = Arc::downgrade(&self.inner.recorder);
        let callback: EntryCallback = Arc::new(move |entry| {
            if let Some(recorder) = weak.upgrade() {
                recorder.record(entry);
            }
        });

        match self.inner.host.observe(category, callback) {
            Ok(handle) => {
                self.inner.handles.lock().push((category, handle));
                debug!("관측 시작: {category}");
                true
            }
            Err(e) => {
                debug!("관측 구독 실패, 건너뜀: {category}: {e}");
                false
            }
        }
    }

    /// 여러 카테고리 구독. 실제 구독된 개수 반환.
    pub fn observe_all(&self, categories: &[ObservationCategory]) -> usize {
        categories.iter().filter(|c| self.observe(**c)).count()
    }

    /// 카테고리 구독 여부
    pub fn is_observing(&self, category: ObservationCategory) -> bool {
        self.inner.handles.lock().iter().any(|(c, _)| *c == category)
    }

    /// 활성 구독 수
    pub fn active_subscriptions(&self) -> usize {
        self.inner.handles.lock().len()
    }

    /// 원시 엔트리 직접 기록 (구독 없이 엔트리를 밀어넣는 호스트용)
    pub fn record(&self, entry: PerformanceEntry) -> Vec<Metric> {
        self.inner.recorder.record(entry)
    }

    /// 지표의 최신 값
    pub fn get_latest(&self, name: &MetricName) -> Option<Metric> {
        self.inner.recorder.state.lock().latest(name)
    }

    /// 지표의 보관된 모든 값
    pub fn get_all(&self, name: &MetricName) -> Vec<Metric> {
        let state = self.inner.recorder.state.lock();
        state
            .metrics
            .get(name)
            .map(|v| v.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Core Web Vitals 요약
    pub fn summary(&self) -> VitalsSummary {
        let state = self.inner.recorder.state.lock();
        VitalsSummary {
            lcp: state.latest(&MetricName::Lcp),
            fid: state.latest(&MetricName::Fid),
            cls: state.latest(&MetricName::Cls),
            ttfb: state.latest(&MetricName::Ttfb),
            long_task_count: state.long_task_count,
            total_blocking_time: state.total_blocking_time,
        }
    }

    /// 페이지 로드 후 `grace` 경과 시 모든 구독 해제 예약
    ///
    /// 다시 호출하면 이전 예약을 대체한다.
    pub fn stop_after(&self, grace: Duration) {
        let set = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            info!("페이지 로드 후 {}ms 경과, 성능 관측 중단", grace.as_millis());
            set.disconnect();
        });
        if let Some(previous) = self.inner.stop_task.lock().replace(task) {
            previous.abort();
        }
    }

    /// 모든 구독 해제 (수집된 지표는 유지)
    pub fn disconnect(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.inner.handles.lock());
        let count = handles.len();
        for (_, mut handle) in handles {
            handle.disconnect();
        }
        if count > 0 {
            debug!("관측 구독 {count}개 해제");
        }
    }

    /// 구독 해제 + 수집된 상태 전부 초기화
    pub fn reset(&self) {
        if let Some(task) = self.inner.stop_task.lock().take() {
            task.abort();
        }
        self.disconnect();
        *self.inner.recorder.state.lock() = ObserverState::default();
        debug!("관측 상태 초기화");
    }
}
