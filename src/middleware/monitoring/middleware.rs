use async_trait::async_trait;
use dashmap::DashMap;
use hyper::header::{HeaderName, HeaderValue};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::config::MonitoringConfig;
use super::endpoint::{endpoint_family, normalize_endpoint};
use super::memory::{format_megabytes, MemorySnapshot};
use super::recorder::{MetricsRecorder, Tags};
use crate::middleware::metrics::duration_ms;
use crate::middleware::{
    ErrorAction, Middleware, MiddlewareCategory, MiddlewareError, MiddlewareOptions, Request,
    RequestContext, Response,
};

pub const REQUEST_ID_HEADER: &str = "x-pipeline-request-id";
pub const RESPONSE_TIME_HEADER: &str = "x-pipeline-response-time";
pub const MEMORY_USAGE_HEADER: &str = "x-pipeline-memory-usage";
pub const MEMORY_PEAK_HEADER: &str = "x-pipeline-memory-peak";

/// 진행 중인 요청의 측정 구간
#[derive(Debug, Clone)]
struct ActiveSpan {
    endpoint: String,
    method: String,
    started: Instant,
    memory: MemorySnapshot,
}

/// 요청 지연, 응답 크기, 메모리 사용량을 측정하는 미들웨어
pub struct MonitoringMiddleware {
    name: String,
    options: MiddlewareOptions,
    config: MonitoringConfig,
    recorder: Arc<dyn MetricsRecorder>,
    spans: DashMap<String, ActiveSpan>,
    sample_seed: u64,
}

impl MonitoringMiddleware {
    pub fn new(
        config: MonitoringConfig,
        recorder: Arc<dyn MetricsRecorder>,
    ) -> Result<Self, MiddlewareError> {
        config.validate()?;
        Ok(Self {
            name: "monitoring".to_string(),
            options: MiddlewareOptions::default(),
            config,
            recorder,
            spans: DashMap::new(),
            sample_seed: rand::random(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_options(mut self, options: MiddlewareOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    /// 아직 끝나지 않은 측정 구간 수
    pub fn active_requests(&self) -> usize {
        self.spans.len()
    }

    /// 요청 ID별 샘플링 여부
    ///
    /// 같은 요청 ID는 모든 단계에서 같은 결정을 받습니다.
    pub fn is_sampled(&self, request_id: &str) -> bool {
        let rate = self.config.sample_rate;
        if rate >= 1.0 {
            return true;
        }
        if rate <= 0.0 {
            return false;
        }

        let mut hasher = DefaultHasher::new();
        self.sample_seed.hash(&mut hasher);
        request_id.hash(&mut hasher);
        let draw = (hasher.finish() >> 11) as f64 / (1u64 << 53) as f64;
        draw < rate
    }

    fn publish_active(&self) {
        self.recorder
            .gauge("api.requests.active", self.spans.len() as f64, &Tags::new());
    }

    fn take_span(&self, ctx: &RequestContext) -> Option<ActiveSpan> {
        self.spans.remove(ctx.request_id()).map(|(_, span)| span)
    }

    /// 응답/에러 단계까지 닫히지 않은 오래된 구간을 버립니다.
    fn evict_stale(&self) {
        let max_age = Duration::from_millis(self.config.max_span_age_ms);
        let before = self.spans.len();
        self.spans.retain(|_, span| span.started.elapsed() < max_age);
        let evicted = before.saturating_sub(self.spans.len());
        if evicted > 0 {
            debug!(evicted, "오래된 측정 구간 정리");
            self.recorder
                .increment("api.spans.evicted", evicted as u64, &Tags::new());
        }
    }

    fn annotate(
        &self,
        res: &mut Response,
        ctx: &RequestContext,
        elapsed_ms: f64,
        memory: MemorySnapshot,
    ) -> Result<(), MiddlewareError> {
        let header = |value: String| {
            HeaderValue::from_str(&value)
                .map_err(|e| MiddlewareError::Processing(format!("모니터링 헤더 생성 실패: {}", e)))
        };

        let headers = res.headers_mut();
        headers.insert(
            HeaderName::from_static(REQUEST_ID_HEADER),
            header(ctx.request_id().to_string())?,
        );
        headers.insert(
            HeaderName::from_static(RESPONSE_TIME_HEADER),
            header(format!("{:.2}ms", elapsed_ms))?,
        );
        headers.insert(
            HeaderName::from_static(MEMORY_USAGE_HEADER),
            header(format_megabytes(memory.current_bytes))?,
        );
        headers.insert(
            HeaderName::from_static(MEMORY_PEAK_HEADER),
            header(format_megabytes(memory.peak_bytes))?,
        );
        Ok(())
    }
}

fn tags(pairs: &[(&str, String)]) -> Tags {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[async_trait]
impl Middleware for MonitoringMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> MiddlewareCategory {
        MiddlewareCategory::Monitoring
    }

    fn options(&self) -> &MiddlewareOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut MiddlewareOptions {
        &mut self.options
    }

    fn custom_should_execute(&self, _req: &Request, ctx: &RequestContext) -> bool {
        self.is_sampled(ctx.request_id())
    }

    async fn on_request(
        &self,
        req: &mut Request,
        ctx: &RequestContext,
    ) -> Result<(), MiddlewareError> {
        let span = ActiveSpan {
            endpoint: normalize_endpoint(req.uri().path()),
            method: req.method().to_string(),
            started: Instant::now(),
            memory: MemorySnapshot::capture(),
        };

        debug!(
            request_id = %ctx.request_id(),
            endpoint = %span.endpoint,
            method = %span.method,
            header_count = req.headers().len(),
            has_body = !req.body().is_empty(),
            "측정 구간 시작"
        );

        self.evict_stale();
        self.spans.insert(ctx.request_id().to_string(), span);
        self.publish_active();
        Ok(())
    }

    async fn on_response(
        &self,
        res: &mut Response,
        req: &Request,
        ctx: &RequestContext,
    ) -> Result<(), MiddlewareError> {
        // 요청 단계를 거치지 않은 경우 컨텍스트 시작 시각을 기준으로 합니다.
        let span = self.take_span(ctx).unwrap_or_else(|| ActiveSpan {
            endpoint: normalize_endpoint(req.uri().path()),
            method: req.method().to_string(),
            started: ctx.started_at(),
            memory: MemorySnapshot::capture(),
        });
        let elapsed_ms = duration_ms(span.started.elapsed());
        let memory = MemorySnapshot::capture();
        let memory_delta = memory.current_bytes as i64 - span.memory.current_bytes as i64;
        let status = res.status().as_u16();
        let size = res.body().len();

        debug!(
            request_id = %ctx.request_id(),
            endpoint = %span.endpoint,
            status,
            size,
            elapsed_ms,
            memory_delta,
            "측정 구간 종료"
        );

        let base = tags(&[
            ("endpoint", span.endpoint.clone()),
            ("method", span.method.clone()),
            ("status", status.to_string()),
        ]);
        self.recorder.timing("api.request.duration", elapsed_ms, &base);
        self.recorder
            .increment(&format!("api.requests.{}", span.endpoint), 1, &base);

        let outcome = if (200..400).contains(&status) {
            "api.requests.success"
        } else {
            "api.requests.error"
        };
        self.recorder.increment(outcome, 1, &base);

        if elapsed_ms > self.config.slow_request_ms as f64 {
            self.recorder.increment("api.requests.slow", 1, &base);
        }
        if size > self.config.large_response_bytes {
            self.recorder.increment("api.responses.large", 1, &base);
        }
        if let Some(family) = endpoint_family(&span.endpoint) {
            self.recorder
                .increment(&format!("api.requests.{}", family), 1, &base);
        }

        self.publish_active();

        if self.config.add_monitoring_headers {
            self.annotate(res, ctx, elapsed_ms, memory)?;
        }
        Ok(())
    }

    async fn on_error(
        &self,
        err: &MiddlewareError,
        req: &Request,
        ctx: &RequestContext,
    ) -> Result<ErrorAction, MiddlewareError> {
        // 에러 단계는 실행 조건을 거치지 않으므로 샘플링과 필터를 직접 확인합니다.
        if !self.is_sampled(ctx.request_id())
            || !self
                .options
                .filter()
                .allows(req.uri().path(), req.method().as_str())
        {
            return Ok(ErrorAction::Propagate);
        }

        // 응답 단계에서 이미 닫힌 구간이면 소요 시간을 다시 기록하지 않습니다.
        let endpoint = match self.take_span(ctx) {
            Some(span) => {
                let base = tags(&[
                    ("endpoint", span.endpoint.clone()),
                    ("method", span.method.clone()),
                    ("status", "0".to_string()),
                    ("error", "true".to_string()),
                ]);
                self.recorder
                    .timing("api.request.duration", duration_ms(span.started.elapsed()), &base);
                span.endpoint
            }
            None => normalize_endpoint(req.uri().path()),
        };

        let metadata = tags(&[
            ("endpoint", endpoint.clone()),
            ("kind", err.kind().to_string()),
            ("message", err.to_string()),
            ("code", err.code().to_string()),
        ]);
        self.recorder.increment(
            &format!("api.errors.{}.{}", endpoint, err.kind()),
            1,
            &metadata,
        );

        trace!(request_id = %ctx.request_id(), kind = err.kind(), "에러 측정 기록");
        self.publish_active();
        Ok(ErrorAction::Propagate)
    }
}
