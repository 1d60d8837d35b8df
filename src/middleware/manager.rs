use std::sync::Arc;
use tracing::{debug, error, info};

use super::config::MiddlewareType;
use super::logging::{LoggingConfig, LoggingMiddleware};
use super::monitoring::{MetricsRecorder, MonitoringConfig, MonitoringMiddleware, TracingRecorder};
use super::validation::{ValidationConfig, ValidationMiddleware};
use super::{Middleware, MiddlewareConfig, MiddlewareError, Pipeline};
use crate::logging::{LogSink, TracingLogSink};
use crate::settings::Settings;

/// 미들웨어가 사용하는 외부 협력 객체
#[derive(Clone)]
pub struct Collaborators {
    pub sink: Arc<dyn LogSink>,
    pub recorder: Arc<dyn MetricsRecorder>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            sink: Arc::new(TracingLogSink),
            recorder: Arc::new(TracingRecorder),
        }
    }
}

/// 미들웨어 설정으로부터 미들웨어 인스턴스를 생성합니다.
pub fn create_middleware(
    name: &str,
    config: &MiddlewareConfig,
    collaborators: &Collaborators,
) -> Result<Box<dyn Middleware>, MiddlewareError> {
    debug!(name, middleware_type = ?config.middleware_type, settings = ?config.settings, "미들웨어 생성 시작");

    let options = config.to_options()?;
    match config.middleware_type {
        MiddlewareType::Logging => {
            let typed: LoggingConfig = config.typed_settings()?;
            let middleware = LoggingMiddleware::new(typed, collaborators.sink.clone())?
                .with_name(name)
                .with_options(options);
            Ok(Box::new(middleware))
        }
        MiddlewareType::Validation => {
            let typed: ValidationConfig = config.typed_settings()?;
            let middleware = ValidationMiddleware::new(typed)?
                .with_name(name)
                .with_options(options);
            Ok(Box::new(middleware))
        }
        MiddlewareType::Monitoring => {
            let typed: MonitoringConfig = config.typed_settings()?;
            let middleware = MonitoringMiddleware::new(typed, collaborators.recorder.clone())?
                .with_name(name)
                .with_options(options);
            Ok(Box::new(middleware))
        }
    }
}

/// 설정만 검사합니다. 미들웨어는 만들지 않습니다.
pub fn validate_settings(config: &MiddlewareConfig) -> Result<(), MiddlewareError> {
    config.to_options()?;
    match config.middleware_type {
        MiddlewareType::Logging => config.typed_settings::<LoggingConfig>()?.validate(),
        MiddlewareType::Validation => {
            // 스키마 매핑 검사는 생성 과정과 같습니다.
            ValidationMiddleware::new(config.typed_settings()?).map(|_| ())
        }
        MiddlewareType::Monitoring => config.typed_settings::<MonitoringConfig>()?.validate(),
    }
}

/// 설정으로 파이프라인을 구성합니다.
///
/// 생성에 실패한 미들웨어는 로그를 남기고 건너뜁니다.
pub fn build_pipeline(settings: &Settings, collaborators: Collaborators) -> Pipeline {
    let mut pipeline = Pipeline::new(settings.pipeline.clone());

    // 같은 우선순위에서 결과가 매번 같도록 이름순으로 추가
    let mut names: Vec<&String> = settings.middlewares.keys().collect();
    names.sort();

    for name in names {
        let config = &settings.middlewares[name];
        match create_middleware(name, config, &collaborators) {
            Ok(middleware) => {
                pipeline.add_boxed(middleware);
            }
            Err(e) => {
                error!(name = %name, error = %e, "미들웨어 생성 실패");
                continue;
            }
        }
    }

    info!(
        middlewares = pipeline.len(),
        enabled = pipeline.config().enabled,
        fail_fast = pipeline.config().fail_fast,
        "파이프라인 구성 완료"
    );
    pipeline
}
