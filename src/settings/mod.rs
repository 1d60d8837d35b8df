use std::{collections::HashMap, env, fs, path::Path};
use serde::Deserialize;
use tracing::debug;
use crate::middleware::config::MiddlewareConfig;
use crate::middleware::PipelineConfig;

pub mod logging;
mod error;

pub use logging::LogSettings;
pub use error::SettingsError;

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    // 파이프라인 설정
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 미들웨어 설정
    #[serde(default)]
    pub middlewares: HashMap<String, MiddlewareConfig>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        if let Ok(config_path) = env::var("STOCK_API_CONFIG_FILE") {
            Self::from_toml_file(&config_path)
        } else {
            Self::from_env()
        }
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| SettingsError::FileError {
            path: path.as_ref().to_string_lossy().to_string(),
            error: e,
        })?;

        debug!(path = %path.as_ref().display(), "설정 파일 로드");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 환경 변수로 로깅과 파이프라인 동작만 설정합니다. 미들웨어는 파일로만 구성합니다.
    pub fn from_env() -> Result<Self> {
        let defaults = PipelineConfig::default();
        let settings = Self {
            logging: LogSettings::from_env()?,
            pipeline: PipelineConfig {
                enabled: parse_env_var("STOCK_API_PIPELINE_ENABLED", || defaults.enabled)?,
                fail_fast: parse_env_var("STOCK_API_PIPELINE_FAIL_FAST", || defaults.fail_fast)?,
                track_performance: parse_env_var("STOCK_API_PIPELINE_TRACK_PERFORMANCE", || {
                    defaults.track_performance
                })?,
                log_execution: parse_env_var("STOCK_API_PIPELINE_LOG_EXECUTION", || {
                    defaults.log_execution
                })?,
            },
            middlewares: HashMap::new(),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// 미들웨어 설정 검증
    ///
    /// 경로 패턴과 미들웨어별 설정이 실제로 생성 가능한지 확인합니다.
    pub fn validate(&self) -> Result<()> {
        for (name, middleware) in &self.middlewares {
            if !middleware.enabled {
                continue;
            }
            crate::middleware::manager::validate_settings(middleware)
                .map_err(|source| SettingsError::Middleware {
                    name: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}
