//! 우선순위 기반 미들웨어 파이프라인
//!
//! 요청 단계, 응답 단계, 에러 단계를 각각 걸어가며 해당 단계에 참여하는
//! 미들웨어를 우선순위가 높은 순서대로 실행합니다. 네트워크 호출은 하지 않으며
//! 변환된 요청을 호출자에게 돌려주고, 호출자가 받은 응답을 다시 넘겨받습니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::metrics::{duration_ms, ExecutionMetric, MetricsLog, MiddlewareTiming, TimingSummary};
use super::{
    ErrorAction, Middleware, MiddlewareCategory, MiddlewareError, Phase, Request, RequestContext,
    Response,
};

/// 파이프라인 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 미들웨어 실패 시 즉시 에러를 호출자에게 전달
    #[serde(default)]
    pub fail_fast: bool,

    /// 단계별 실행 메트릭 기록
    #[serde(default = "default_true")]
    pub track_performance: bool,

    /// 미들웨어 실행마다 디버그 로그 출력
    #[serde(default)]
    pub log_execution: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_fast: false,
            track_performance: true,
            log_execution: false,
        }
    }
}

struct Entry {
    seq: u64,
    middleware: Box<dyn Middleware>,
}

pub struct Pipeline {
    entries: Vec<Entry>,
    next_seq: u64,
    config: PipelineConfig,
    metrics: Arc<MetricsLog>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_metrics(config, Arc::new(MetricsLog::new()))
    }

    /// 외부에서 만든 메트릭 저장소를 공유합니다.
    pub fn with_metrics(config: PipelineConfig, metrics: Arc<MetricsLog>) -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PipelineConfig) {
        self.config = config;
    }

    pub fn metrics(&self) -> &Arc<MetricsLog> {
        &self.metrics
    }

    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.add_boxed(Box::new(middleware))
    }

    pub fn add_boxed(&mut self, middleware: Box<dyn Middleware>) -> &mut Self {
        debug!(
            middleware = middleware.name(),
            category = %middleware.category(),
            priority = middleware.priority(),
            "미들웨어 추가"
        );
        self.entries.push(Entry {
            seq: self.next_seq,
            middleware,
        });
        self.next_seq += 1;
        self.sort();
        self
    }

    /// 이름으로 미들웨어를 제거합니다. 같은 이름이 여럿이면 첫 번째만.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Middleware>> {
        let index = self
            .entries
            .iter()
            .position(|e| e.middleware.name() == name)?;
        let removed = self.entries.remove(index).middleware;
        self.sort();
        Some(removed)
    }

    pub fn remove_category(&mut self, category: MiddlewareCategory) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.middleware.category() != category);
        self.sort();
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // 우선순위 내림차순, 같으면 추가된 순서
    fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            b.middleware
                .priority()
                .cmp(&a.middleware.priority())
                .then(a.seq.cmp(&b.seq))
        });
    }

    /// 우선순위 순서로 정렬된 전체 미들웨어 (비활성 포함)
    pub fn middleware(&self) -> Vec<&dyn Middleware> {
        self.entries.iter().map(|e| e.middleware.as_ref()).collect()
    }

    pub fn request_middleware(&self) -> Vec<&dyn Middleware> {
        self.phase_middleware(Phase::Request)
    }

    pub fn response_middleware(&self) -> Vec<&dyn Middleware> {
        self.phase_middleware(Phase::Response)
    }

    pub fn error_middleware(&self) -> Vec<&dyn Middleware> {
        self.phase_middleware(Phase::Error)
    }

    fn phase_middleware(&self, phase: Phase) -> Vec<&dyn Middleware> {
        self.entries
            .iter()
            .map(|e| e.middleware.as_ref())
            .filter(|m| m.is_enabled() && m.category().applies_to(phase))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Middleware> {
        self.entries
            .iter()
            .find(|e| e.middleware.name() == name)
            .map(|e| e.middleware.as_ref())
    }

    pub fn has_middleware<T: Middleware + 'static>(&self) -> bool {
        self.entries.iter().any(|e| e.middleware.as_ref().is::<T>())
    }

    pub fn has_category(&self, category: MiddlewareCategory) -> bool {
        self.entries
            .iter()
            .any(|e| e.middleware.category() == category)
    }

    /// 활성화 여부는 참여만 바꾸고 순서는 바꾸지 않습니다.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.middleware.name() == name) {
            Some(entry) => {
                entry.middleware.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn enable_all(&mut self) {
        for entry in &mut self.entries {
            entry.middleware.set_enabled(true);
        }
    }

    pub fn disable_all(&mut self) {
        for entry in &mut self.entries {
            entry.middleware.set_enabled(false);
        }
    }

    pub fn set_priority(&mut self, name: &str, priority: i32) -> bool {
        let found = match self.entries.iter_mut().find(|e| e.middleware.name() == name) {
            Some(entry) => {
                entry.middleware.set_priority(priority);
                true
            }
            None => false,
        };
        if found {
            self.sort();
        }
        found
    }

    /// 요청 단계를 실행하고 변환된 요청을 돌려줍니다.
    pub async fn process_request(
        &self,
        mut request: Request,
        ctx: &RequestContext,
    ) -> Result<Request, MiddlewareError> {
        if !self.config.enabled {
            return Ok(request);
        }

        let started = Instant::now();
        let mut timings = Vec::new();
        let mut failure = None;

        for middleware in self.request_middleware() {
            if !middleware.should_execute(&request, ctx) {
                continue;
            }

            let mw_started = Instant::now();
            let result = middleware.process_request(&mut request, ctx).await;
            self.record_timing(&mut timings, middleware, mw_started, Phase::Request, ctx);

            if let Err(e) = result {
                self.handle_pipeline_error(Phase::Request, middleware, &e, ctx);
                failure = Some(e);
                break;
            }
        }

        if let Some(e) = failure {
            if self.config.fail_fast {
                return Err(e);
            }
        }

        self.record_execution(Phase::Request, started, timings);
        Ok(request)
    }

    /// 응답 단계를 실행하고 변환된 응답을 돌려줍니다.
    pub async fn process_response(
        &self,
        mut response: Response,
        request: &Request,
        ctx: &RequestContext,
    ) -> Result<Response, MiddlewareError> {
        if !self.config.enabled {
            return Ok(response);
        }

        let started = Instant::now();
        let mut timings = Vec::new();
        let mut failure = None;

        for middleware in self.response_middleware() {
            if !middleware.should_execute(request, ctx) {
                continue;
            }

            let mw_started = Instant::now();
            let result = middleware.process_response(&mut response, request, ctx).await;
            self.record_timing(&mut timings, middleware, mw_started, Phase::Response, ctx);

            if let Err(e) = result {
                self.handle_pipeline_error(Phase::Response, middleware, &e, ctx);
                failure = Some(e);
                break;
            }
        }

        if let Some(e) = failure {
            if self.config.fail_fast {
                return Err(e);
            }
        }

        self.record_execution(Phase::Response, started, timings);
        Ok(response)
    }

    /// 에러 단계를 실행합니다.
    ///
    /// 호출자에게 전달할 에러를 돌려주며, 미들웨어가 에러를 삼켰다면 None 입니다.
    /// fail_fast 에서 에러 처리기가 실패하면 원래 에러를 원인으로 감싼 에러를 돌려줍니다.
    pub async fn handle_error(
        &self,
        error: MiddlewareError,
        request: &Request,
        ctx: &RequestContext,
    ) -> Option<MiddlewareError> {
        if !self.config.enabled {
            return Some(error);
        }

        let mut current = error;
        for middleware in self.error_middleware() {
            match middleware.handle_error(&current, request, ctx).await {
                Ok(ErrorAction::Propagate) => {}
                Ok(ErrorAction::Replace(replacement)) => {
                    debug!(
                        request_id = %ctx.request_id(),
                        middleware = middleware.name(),
                        from = current.kind(),
                        to = replacement.kind(),
                        "에러 교체"
                    );
                    current = replacement;
                }
                Ok(ErrorAction::Suppress) => {
                    debug!(
                        request_id = %ctx.request_id(),
                        middleware = middleware.name(),
                        error = %current,
                        "에러가 미들웨어에 의해 무시됨"
                    );
                    return None;
                }
                Err(secondary) => {
                    self.handle_pipeline_error(Phase::Error, middleware, &secondary, ctx);
                    if self.config.fail_fast {
                        return Some(current.wrap(format!(
                            "미들웨어 {} 에러 처리 실패 ({})",
                            middleware.name(),
                            secondary
                        )));
                    }
                }
            }
        }

        Some(current)
    }

    fn record_timing(
        &self,
        timings: &mut Vec<MiddlewareTiming>,
        middleware: &dyn Middleware,
        started: Instant,
        phase: Phase,
        ctx: &RequestContext,
    ) {
        let elapsed = duration_ms(started.elapsed());
        if self.config.log_execution {
            debug!(
                request_id = %ctx.request_id(),
                middleware = middleware.name(),
                category = %middleware.category(),
                phase = %phase,
                duration_ms = elapsed,
                "미들웨어 실행"
            );
        }
        timings.push(MiddlewareTiming {
            middleware: middleware.name().to_string(),
            category: middleware.category(),
            duration_ms: elapsed,
        });
    }

    fn record_execution(&self, phase: Phase, started: Instant, timings: Vec<MiddlewareTiming>) {
        if !self.config.track_performance {
            return;
        }
        self.metrics
            .record(ExecutionMetric::new(phase, started.elapsed(), timings));
    }

    fn handle_pipeline_error(
        &self,
        phase: Phase,
        middleware: &dyn Middleware,
        err: &MiddlewareError,
        ctx: &RequestContext,
    ) {
        if self.config.fail_fast {
            error!(
                request_id = %ctx.request_id(),
                phase = %phase,
                middleware = middleware.name(),
                category = %middleware.category(),
                kind = err.kind(),
                error = %err,
                "미들웨어 실행 실패 (fail-fast)"
            );
        } else {
            warn!(
                request_id = %ctx.request_id(),
                phase = %phase,
                middleware = middleware.name(),
                category = %middleware.category(),
                kind = err.kind(),
                error = %err,
                "미들웨어 실행 실패, 계속 진행"
            );
        }
    }

    pub fn statistics(&self) -> PipelineStatistics {
        let mut by_category = BTreeMap::new();
        for entry in &self.entries {
            *by_category.entry(entry.middleware.category()).or_insert(0) += 1;
        }

        PipelineStatistics {
            total: self.entries.len(),
            enabled: self.entries.iter().filter(|e| e.middleware.is_enabled()).count(),
            by_category,
            by_phase: PhaseCounts {
                request: self.request_middleware().len(),
                response: self.response_middleware().len(),
                error: self.error_middleware().len(),
            },
            recorded_executions: self.metrics.len(),
            timing: self.metrics.timing_summary(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseCounts {
    pub request: usize,
    pub response: usize,
    pub error: usize,
}

/// 파이프라인 상태 요약
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatistics {
    pub total: usize,
    pub enabled: usize,
    pub by_category: BTreeMap<MiddlewareCategory, usize>,
    pub by_phase: PhaseCounts,
    pub recorded_executions: usize,
    pub timing: Option<TimingSummary>,
}

/// 실행 중 교체 가능한 파이프라인
///
/// 요청은 시작 시점의 스냅샷을 끝까지 사용하므로 구조 변경이
/// 진행 중인 요청과 섞이지 않습니다.
#[derive(Clone)]
pub struct SharedPipeline {
    current: Arc<RwLock<Arc<Pipeline>>>,
}

impl SharedPipeline {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(pipeline))),
        }
    }

    pub async fn snapshot(&self) -> Arc<Pipeline> {
        self.current.read().await.clone()
    }

    /// 새 파이프라인으로 교체하고 이전 것을 돌려줍니다.
    pub async fn replace(&self, pipeline: Pipeline) -> Arc<Pipeline> {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, Arc::new(pipeline))
    }
}
