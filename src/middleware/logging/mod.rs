//! 로깅 미들웨어
//!
//! 요청, 응답, 에러를 로그 싱크로 기록합니다. 민감한 헤더와 본문 필드는 가려집니다.

mod config;
mod middleware;
pub mod redact;

pub use config::LoggingConfig;
pub use middleware::LoggingMiddleware;
