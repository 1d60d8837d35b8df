use async_trait::async_trait;
use serde_json::{Map, Value};
use std::error::Error as _;
use std::sync::Arc;

use super::config::LoggingConfig;
use super::redact::{sanitize_body, sanitize_headers};
use crate::logging::{LogLevel, LogSink};
use crate::middleware::metrics::duration_ms;
use crate::middleware::{
    ErrorAction, Middleware, MiddlewareCategory, MiddlewareError, MiddlewareOptions, Request,
    RequestContext, Response,
};

/// 요청/응답/에러를 구조화된 기록으로 남기는 미들웨어
pub struct LoggingMiddleware {
    name: String,
    options: MiddlewareOptions,
    config: LoggingConfig,
    sink: Arc<dyn LogSink>,
}

impl LoggingMiddleware {
    pub fn new(config: LoggingConfig, sink: Arc<dyn LogSink>) -> Result<Self, MiddlewareError> {
        config.validate()?;
        Ok(Self {
            name: "logging".to_string(),
            options: MiddlewareOptions::default(),
            config,
            sink,
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

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// 상태 코드에 따라 레벨을 올립니다.
    pub fn response_level(&self, status: u16) -> LogLevel {
        match status {
            500..=u16::MAX => LogLevel::Error,
            400..=499 => LogLevel::Warning,
            300..=399 => LogLevel::Info,
            _ => self.config.log_level,
        }
    }

    fn body_excerpt(&self, body: &[u8]) -> Value {
        sanitize_body(
            body,
            &self.config.sensitive_fields,
            self.config.mask_sensitive_data,
            self.config.max_body_length,
        )
    }

    fn headers(&self, headers: &hyper::HeaderMap) -> Value {
        Value::Object(sanitize_headers(
            headers,
            &self.config.sensitive_headers,
            self.config.mask_sensitive_data,
        ))
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> MiddlewareCategory {
        MiddlewareCategory::Logging
    }

    fn options(&self) -> &MiddlewareOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut MiddlewareOptions {
        &mut self.options
    }

    async fn on_request(
        &self,
        req: &mut Request,
        ctx: &RequestContext,
    ) -> Result<(), MiddlewareError> {
        if !self.config.log_requests {
            return Ok(());
        }

        let mut record = Map::new();
        record.insert("request_id".into(), ctx.request_id().into());
        record.insert("method".into(), req.method().as_str().into());
        record.insert("uri".into(), req.uri().to_string().into());
        record.insert("protocol".into(), format!("{:?}", req.version()).into());

        if self.config.log_request_headers {
            record.insert("headers".into(), self.headers(req.headers()));
        }
        if self.config.log_request_body && !req.body().is_empty() {
            record.insert("body".into(), self.body_excerpt(req.body()));
        }

        self.sink.log(self.config.log_level, "HTTP Request", &record);
        Ok(())
    }

    async fn on_response(
        &self,
        res: &mut Response,
        req: &Request,
        ctx: &RequestContext,
    ) -> Result<(), MiddlewareError> {
        if !self.config.log_responses {
            return Ok(());
        }

        let status = res.status();
        let mut record = Map::new();
        record.insert("request_id".into(), ctx.request_id().into());
        record.insert("status".into(), status.as_u16().into());
        record.insert("reason".into(), status.canonical_reason().unwrap_or("").into());
        record.insert("request_method".into(), req.method().as_str().into());
        record.insert("request_uri".into(), req.uri().to_string().into());
        record.insert("response_size".into(), res.body().len().into());

        if let Some(duration) = ctx.duration() {
            record.insert("duration_ms".into(), duration_ms(duration).into());
        }
        if self.config.log_response_headers {
            record.insert("headers".into(), self.headers(res.headers()));
        }
        if self.config.log_response_body && !res.body().is_empty() {
            record.insert("body".into(), self.body_excerpt(res.body()));
        }

        let level = self.response_level(status.as_u16());
        self.sink.log(level, "HTTP Response", &record);
        Ok(())
    }

    async fn on_error(
        &self,
        err: &MiddlewareError,
        req: &Request,
        ctx: &RequestContext,
    ) -> Result<ErrorAction, MiddlewareError> {
        if !self.config.log_errors {
            return Ok(ErrorAction::Propagate);
        }

        let mut record = Map::new();
        record.insert("request_id".into(), ctx.request_id().into());
        record.insert("method".into(), req.method().as_str().into());
        record.insert("uri".into(), req.uri().to_string().into());
        record.insert("error_class".into(), err.kind().into());
        record.insert("message".into(), err.to_string().into());
        record.insert("code".into(), err.code().into());

        if self.config.log_stack_trace {
            let mut trace = vec![Value::from(format!("{:?}", err))];
            let mut source = err.source();
            while let Some(cause) = source {
                trace.push(cause.to_string().into());
                source = cause.source();
            }
            record.insert("trace".into(), Value::Array(trace));
        }

        self.sink.log(LogLevel::Error, "HTTP Error", &record);
        Ok(ErrorAction::Propagate)
    }
}
