use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hyper::header::{HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::config::ValidationConfig;
use super::schema::BuiltinSchema;
use super::validator::{JsonSchemaValidator, SchemaValidator, ValidationReport};
use crate::middleware::pattern::GlobPattern;
use crate::middleware::{
    Middleware, MiddlewareCategory, MiddlewareError, MiddlewareOptions, Request, RequestContext,
    Response,
};

pub const VALIDATION_RESULT_HEADER: &str = "x-pipeline-validation-result";
pub const VALIDATION_ERRORS_HEADER: &str = "x-pipeline-validation-errors";
pub const VALIDATION_DETAILS_HEADER: &str = "x-pipeline-validation-details";

struct RegisteredValidator {
    pattern: GlobPattern,
    validator: Arc<dyn SchemaValidator>,
}

/// 응답 본문을 스키마로 검증하는 미들웨어
pub struct ValidationMiddleware {
    name: String,
    options: MiddlewareOptions,
    config: ValidationConfig,
    validators: Vec<RegisteredValidator>,
    mappings: Vec<(GlobPattern, BuiltinSchema)>,
    builtins: HashMap<BuiltinSchema, Arc<dyn SchemaValidator>>,
}

impl ValidationMiddleware {
    pub fn new(config: ValidationConfig) -> Result<Self, MiddlewareError> {
        let mut mappings = Vec::with_capacity(config.schema_mappings.len());
        for (pattern, schema) in &config.schema_mappings {
            let schema = schema
                .parse::<BuiltinSchema>()
                .map_err(MiddlewareError::Config)?;
            mappings.push((GlobPattern::new(pattern)?, schema));
        }

        let mut builtins: HashMap<BuiltinSchema, Arc<dyn SchemaValidator>> = HashMap::new();
        for schema in BuiltinSchema::ALL {
            let validator = JsonSchemaValidator::from_str(schema.name(), schema.definition())?;
            builtins.insert(schema, Arc::new(validator));
        }

        Ok(Self {
            name: "validation".to_string(),
            options: MiddlewareOptions::default(),
            config,
            validators: Vec::new(),
            mappings,
            builtins,
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

    /// 경로(또는 와일드카드 패턴)에 검증기를 등록합니다.
    pub fn register_validator(
        &mut self,
        path: &str,
        validator: Arc<dyn SchemaValidator>,
    ) -> Result<&mut Self, MiddlewareError> {
        self.validators.push(RegisteredValidator {
            pattern: GlobPattern::new(path)?,
            validator,
        });
        Ok(self)
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// 요청 경로와 응답 상태로 검증기를 찾습니다.
    ///
    /// 순서: 등록된 정확한 경로, 등록된 와일드카드 패턴, 자동 감지.
    pub fn resolve_validator(&self, path: &str, status: u16) -> Option<Arc<dyn SchemaValidator>> {
        if let Some(found) = self.validators.iter().find(|v| v.pattern.as_str() == path) {
            return Some(found.validator.clone());
        }
        if let Some(found) = self.validators.iter().find(|v| v.pattern.matches(path)) {
            return Some(found.validator.clone());
        }
        if !self.config.auto_detect_schemas {
            return None;
        }

        let schema = if status >= 400 && self.config.validate_error_responses {
            Some(BuiltinSchema::ErrorResponse)
        } else {
            self.mappings
                .iter()
                .find(|(pattern, _)| pattern.matches(path))
                .map(|(_, schema)| *schema)
        }?;
        self.builtins.get(&schema).cloned()
    }

    fn annotate(&self, res: &mut Response, report: &ValidationReport) -> Result<(), MiddlewareError> {
        let headers = res.headers_mut();
        let result = if report.is_valid() { "passed" } else { "failed" };
        headers.insert(
            HeaderName::from_static(VALIDATION_RESULT_HEADER),
            HeaderValue::from_static(result),
        );
        headers.insert(
            HeaderName::from_static(VALIDATION_ERRORS_HEADER),
            HeaderValue::from(report.error_count() as u64),
        );

        if !report.is_valid() {
            let details = serde_json::to_vec(&report.formatted_errors())?;
            let encoded = BASE64.encode(details);
            let value = HeaderValue::from_str(&encoded)
                .map_err(|e| MiddlewareError::Processing(format!("검증 헤더 생성 실패: {}", e)))?;
            headers.insert(HeaderName::from_static(VALIDATION_DETAILS_HEADER), value);
        }
        Ok(())
    }
}

#[async_trait]
impl Middleware for ValidationMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> MiddlewareCategory {
        MiddlewareCategory::Validation
    }

    fn options(&self) -> &MiddlewareOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut MiddlewareOptions {
        &mut self.options
    }

    fn custom_should_execute(&self, _req: &Request, _ctx: &RequestContext) -> bool {
        self.config.validate_responses
    }

    async fn on_response(
        &self,
        res: &mut Response,
        req: &Request,
        ctx: &RequestContext,
    ) -> Result<(), MiddlewareError> {
        let path = req.uri().path();
        let Some(validator) = self.resolve_validator(path, res.status().as_u16()) else {
            return Ok(());
        };

        let report = match serde_json::from_slice::<Value>(res.body()) {
            Ok(data) => validator.validate(&data),
            Err(e) => ValidationReport::failure("", format!("root must be valid JSON ({})", e)),
        };

        if report.is_valid() {
            debug!(request_id = %ctx.request_id(), path, schema = validator.name(), "응답 검증 통과");
        } else {
            warn!(
                request_id = %ctx.request_id(),
                path,
                schema = validator.name(),
                errors = ?report.formatted_errors(),
                "응답 검증 실패"
            );
        }

        if self.config.add_validation_headers {
            self.annotate(res, &report)?;
        }

        if self.config.fail_on_validation_error && !report.is_valid() {
            return Err(MiddlewareError::Validation {
                messages: report.formatted_errors(),
            });
        }
        Ok(())
    }
}
