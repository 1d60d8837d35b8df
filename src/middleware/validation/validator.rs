use jsonschema::{Draft, JSONSchema};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::middleware::MiddlewareError;

/// 필드 단위 검증 오류
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// JSON 포인터 형식 경로. 루트면 빈 문자열.
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn formatted(&self) -> String {
        let path = if self.path.is_empty() { "root" } else { &self.path };
        format!("{}: {}", path, self.message)
    }
}

/// 검증 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn passed() -> Self {
        Self::default()
    }

    pub fn failure(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                path: path.into(),
                message: message.into(),
            }],
        }
    }

    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn formatted_errors(&self) -> Vec<String> {
        self.errors.iter().map(FieldError::formatted).collect()
    }
}

/// 응답 데이터 검증기
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, data: &Value) -> ValidationReport;

    fn name(&self) -> &str {
        "custom"
    }
}

/// JSON Schema(Draft 7) 기반 검증기
pub struct JsonSchemaValidator {
    name: String,
    schema: JSONSchema,
}

impl JsonSchemaValidator {
    pub fn new(name: impl Into<String>, schema: &Value) -> Result<Self, MiddlewareError> {
        let name = name.into();
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| MiddlewareError::Config(format!("스키마 {} 컴파일 오류: {}", name, e)))?;

        debug!(schema = %name, "JSON 스키마 컴파일 성공");
        Ok(Self { name, schema })
    }

    pub fn from_str(name: impl Into<String>, schema: &str) -> Result<Self, MiddlewareError> {
        let name = name.into();
        let value: Value = serde_json::from_str(schema)
            .map_err(|e| MiddlewareError::Config(format!("스키마 {} 파싱 오류: {}", name, e)))?;
        Self::new(name, &value)
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, data: &Value) -> ValidationReport {
        match self.schema.validate(data) {
            Ok(()) => ValidationReport::passed(),
            Err(errors) => ValidationReport::from_errors(
                errors
                    .map(|error| FieldError {
                        path: error.instance_path.to_string(),
                        message: error.to_string(),
                    })
                    .collect(),
            ),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
