use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::middleware::MiddlewareError;

/// 로깅 미들웨어 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_requests: bool,
    pub log_responses: bool,
    pub log_errors: bool,
    pub log_request_headers: bool,
    pub log_request_body: bool,
    pub log_response_headers: bool,
    pub log_response_body: bool,

    /// 민감한 헤더와 본문 필드를 가림
    pub mask_sensitive_data: bool,

    /// 대소문자 구분 없이 비교
    pub sensitive_headers: Vec<String>,
    pub sensitive_fields: Vec<String>,

    /// 본문 발췌 최대 길이 (문자 수)
    pub max_body_length: usize,

    /// 상태 코드로 승격되지 않는 기록의 기본 레벨
    pub log_level: LogLevel,

    /// 에러 원인 체인 기록. 기본값은 꺼짐.
    pub log_stack_trace: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_requests: true,
            log_responses: true,
            log_errors: true,
            log_request_headers: true,
            log_request_body: false,
            log_response_headers: false,
            log_response_body: false,
            mask_sensitive_data: true,
            sensitive_headers: default_sensitive_headers(),
            sensitive_fields: default_sensitive_fields(),
            max_body_length: 1000,
            log_level: LogLevel::Info,
            log_stack_trace: false,
        }
    }
}

fn default_sensitive_headers() -> Vec<String> {
    ["authorization", "x-api-key", "cookie", "set-cookie", "proxy-authorization"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_sensitive_fields() -> Vec<String> {
    [
        "api_key",
        "apikey",
        "password",
        "token",
        "secret",
        "access_token",
        "refresh_token",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), MiddlewareError> {
        if self.max_body_length == 0 {
            return Err(MiddlewareError::Config(
                "max_body_length 는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}
