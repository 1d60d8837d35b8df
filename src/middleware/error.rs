use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum MiddlewareError {
    #[error("설정 오류: {0}")]
    Config(String),

    #[error("처리 오류: {0}")]
    Processing(String),

    #[error("미들웨어 {middleware} 실행 실패: {message}")]
    Execution {
        middleware: String,
        message: String,
    },

    #[error("응답 검증 실패: {}", .messages.join("; "))]
    Validation {
        messages: Vec<String>,
    },

    #[error("전송 오류: {0}")]
    Transport(String),

    #[error("요청 시간 초과: {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Http(#[from] hyper::http::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<MiddlewareError>,
    },
}

impl MiddlewareError {
    pub fn execution(middleware: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            middleware: middleware.into(),
            message: message.into(),
        }
    }

    /// 기존 에러를 원인으로 보존한 채 맥락을 덧붙입니다.
    pub fn wrap(self, context: impl Into<String>) -> Self {
        Self::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// 로그와 메트릭에서 사용하는 에러 종류 이름
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Processing(_) => "ProcessingError",
            Self::Execution { .. } => "ExecutionError",
            Self::Validation { .. } => "ValidationError",
            Self::Transport(_) => "TransportError",
            Self::Timeout(_) => "TimeoutError",
            Self::Http(_) => "HttpError",
            Self::Json(_) => "JsonError",
            Self::Wrapped { .. } => "WrappedError",
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Transport(_) => 502,
            Self::Timeout(_) => 504,
            Self::Wrapped { source, .. } => source.code(),
            _ => 500,
        }
    }

    /// 래핑을 모두 벗긴 최초 원인
    pub fn root_cause(&self) -> &MiddlewareError {
        match self {
            Self::Wrapped { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, MiddlewareError>;
