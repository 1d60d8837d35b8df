use dashmap::DashMap;
use std::collections::BTreeMap;
use tracing::info;

/// 지표 태그
pub type Tags = BTreeMap<String, String>;

/// 모니터링 미들웨어가 지표를 내보내는 대상
pub trait MetricsRecorder: Send + Sync {
    fn increment(&self, name: &str, value: u64, tags: &Tags);

    fn timing(&self, name: &str, duration_ms: f64, tags: &Tags);

    fn gauge(&self, name: &str, value: f64, tags: &Tags);
}

/// 지표를 메모리에 누적하는 기록기
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    counters: DashMap<String, u64>,
    timings: DashMap<String, Vec<f64>>,
    gauges: DashMap<String, f64>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).map(|v| *v).unwrap_or(0)
    }

    pub fn timings(&self, name: &str) -> Vec<f64> {
        self.timings
            .get(name)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn gauge_value(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).map(|v| *v)
    }

    pub fn counter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.counters.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl MetricsRecorder for InMemoryRecorder {
    fn increment(&self, name: &str, value: u64, _tags: &Tags) {
        *self.counters.entry(name.to_string()).or_insert(0) += value;
    }

    fn timing(&self, name: &str, duration_ms: f64, _tags: &Tags) {
        self.timings
            .entry(name.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn gauge(&self, name: &str, value: f64, _tags: &Tags) {
        self.gauges.insert(name.to_string(), value);
    }
}

/// 지표를 tracing 이벤트로 남기는 기록기
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

impl MetricsRecorder for TracingRecorder {
    fn increment(&self, name: &str, value: u64, tags: &Tags) {
        info!(target: "stock_api_pipeline::metrics", metric = name, value, tags = ?tags, "counter");
    }

    fn timing(&self, name: &str, duration_ms: f64, tags: &Tags) {
        info!(target: "stock_api_pipeline::metrics", metric = name, duration_ms, tags = ?tags, "timing");
    }

    fn gauge(&self, name: &str, value: f64, tags: &Tags) {
        info!(target: "stock_api_pipeline::metrics", metric = name, value, tags = ?tags, "gauge");
    }
}
