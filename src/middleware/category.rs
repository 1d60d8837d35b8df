use serde::{Deserialize, Serialize};
use std::fmt;

/// 미들웨어 분류
///
/// 분류마다 기본 우선순위와 참여하는 단계(요청/응답/에러)가 고정되어 있습니다.
/// 우선순위는 인스턴스별로 덮어쓸 수 있지만 단계 플래그는 바꿀 수 없습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewareCategory {
    Monitoring,
    Security,
    RateLimit,
    Retry,
    Caching,
    Logging,
    Transformation,
    Validation,
}

impl MiddlewareCategory {
    pub const ALL: [MiddlewareCategory; 8] = [
        MiddlewareCategory::Monitoring,
        MiddlewareCategory::Security,
        MiddlewareCategory::RateLimit,
        MiddlewareCategory::Retry,
        MiddlewareCategory::Caching,
        MiddlewareCategory::Logging,
        MiddlewareCategory::Transformation,
        MiddlewareCategory::Validation,
    ];

    /// 기본 우선순위 (높을수록 먼저 실행)
    pub const fn priority(self) -> i32 {
        match self {
            Self::Monitoring => 1000,
            Self::Security => 900,
            Self::RateLimit => 800,
            Self::Retry => 700,
            Self::Caching => 600,
            Self::Logging => 500,
            Self::Transformation => 300,
            Self::Validation => 100,
        }
    }

    pub const fn is_request_phase(self) -> bool {
        !matches!(self, Self::Validation)
    }

    pub const fn is_response_phase(self) -> bool {
        matches!(
            self,
            Self::Monitoring | Self::Logging | Self::Transformation | Self::Validation
        )
    }

    pub const fn is_error_phase(self) -> bool {
        matches!(self, Self::Monitoring | Self::Logging)
    }

    pub const fn applies_to(self, phase: Phase) -> bool {
        match phase {
            Phase::Request => self.is_request_phase(),
            Phase::Response => self.is_response_phase(),
            Phase::Error => self.is_error_phase(),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monitoring => "monitoring",
            Self::Security => "security",
            Self::RateLimit => "rate_limit",
            Self::Retry => "retry",
            Self::Caching => "caching",
            Self::Logging => "logging",
            Self::Transformation => "transformation",
            Self::Validation => "validation",
        }
    }
}

impl fmt::Display for MiddlewareCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 미들웨어가 개입하는 지점
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Request,
    Response,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Request => f.write_str("request"),
            Phase::Response => f.write_str("response"),
            Phase::Error => f.write_str("error"),
        }
    }
}
