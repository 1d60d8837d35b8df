use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use time::OffsetDateTime;

use super::{MiddlewareCategory, Phase};

/// 보관 한도. 이 수를 넘으면 최근 항목만 남깁니다.
pub const METRICS_CAPACITY: usize = 100;
pub const METRICS_RETAINED: usize = 50;

/// 미들웨어 하나의 실행 기록
#[derive(Debug, Clone, Serialize)]
pub struct MiddlewareTiming {
    pub middleware: String,
    pub category: MiddlewareCategory,
    pub duration_ms: f64,
}

/// 한 번의 단계 실행 요약
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionMetric {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub phase: Phase,
    pub total_ms: f64,
    pub middlewares: Vec<MiddlewareTiming>,
}

impl ExecutionMetric {
    pub fn new(phase: Phase, total: Duration, middlewares: Vec<MiddlewareTiming>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            phase,
            total_ms: duration_ms(total),
            middlewares,
        }
    }
}

pub(crate) fn duration_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// 크기가 제한된 실행 메트릭 저장소
///
/// 여러 요청이 동시에 기록해도 추가와 정리가 한 번의 잠금 안에서 이루어집니다.
#[derive(Debug, Default)]
pub struct MetricsLog {
    entries: Mutex<VecDeque<ExecutionMetric>>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, metric: ExecutionMetric) {
        let mut entries = self.entries.lock();
        entries.push_back(metric);
        if entries.len() > METRICS_CAPACITY {
            let excess = entries.len() - METRICS_RETAINED;
            entries.drain(..excess);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<ExecutionMetric> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// 보관 중인 메트릭의 총 소요 시간 통계
    pub fn timing_summary(&self) -> Option<TimingSummary> {
        let entries = self.entries.lock();
        if entries.is_empty() {
            return None;
        }

        let mut min = f64::MAX;
        let mut max = 0.0f64;
        let mut sum = 0.0;
        for entry in entries.iter() {
            min = min.min(entry.total_ms);
            max = max.max(entry.total_ms);
            sum += entry.total_ms;
        }

        Some(TimingSummary {
            count: entries.len(),
            min_ms: min,
            avg_ms: sum / entries.len() as f64,
            max_ms: max,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSummary {
    pub count: usize,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
}
