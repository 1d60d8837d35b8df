//! 응답 검증 미들웨어
//!
//! 요청 경로에 맞는 스키마로 응답 본문을 검증하고, 설정에 따라 결과를
//! 헤더로 노출하거나 에러로 승격합니다.

mod config;
mod middleware;
pub mod schema;
mod validator;

pub use config::ValidationConfig;
pub use middleware::{
    ValidationMiddleware, VALIDATION_DETAILS_HEADER, VALIDATION_ERRORS_HEADER,
    VALIDATION_RESULT_HEADER,
};
pub use schema::BuiltinSchema;
pub use validator::{FieldError, JsonSchemaValidator, SchemaValidator, ValidationReport};
