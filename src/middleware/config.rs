use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::pattern::{matches_any, GlobPattern};
use super::MiddlewareError;

/// 설정 파일에서 선택할 수 있는 미들웨어 종류
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MiddlewareType {
    Logging,
    Validation,
    Monitoring,
}

/// 설정 파일의 `[middlewares.<name>]` 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// 미들웨어 타입
    #[serde(rename = "type", alias = "middleware_type")]
    pub middleware_type: MiddlewareType,

    /// 미들웨어 활성화 여부
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// 실행 우선순위 (높은 숫자가 먼저 실행). 없으면 분류 기본값.
    #[serde(default)]
    pub priority: Option<i32>,

    #[serde(default)]
    pub only_paths: Vec<String>,

    #[serde(default)]
    pub except_paths: Vec<String>,

    #[serde(default)]
    pub only_methods: Vec<String>,

    #[serde(default)]
    pub except_methods: Vec<String>,

    /// 미들웨어별 설정
    #[serde(default)]
    pub settings: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl MiddlewareConfig {
    pub fn new(middleware_type: MiddlewareType) -> Self {
        Self {
            middleware_type,
            enabled: true,
            priority: None,
            only_paths: Vec::new(),
            except_paths: Vec::new(),
            only_methods: Vec::new(),
            except_methods: Vec::new(),
            settings: Map::new(),
        }
    }

    /// TOML 설정에서 미들웨어 설정을 파싱합니다.
    pub fn from_toml(config: &str) -> Result<HashMap<String, Self>, toml::de::Error> {
        #[derive(Deserialize)]
        struct Config {
            #[serde(default)]
            middlewares: HashMap<String, MiddlewareConfig>,
        }

        let config: Config = toml::from_str(config)?;
        Ok(config.middlewares)
    }

    /// 패턴을 컴파일하여 실행 시점 옵션을 만듭니다.
    pub fn to_options(&self) -> Result<MiddlewareOptions, MiddlewareError> {
        let filter = RequestFilter::new(
            self.only_paths.as_slice(),
            self.except_paths.as_slice(),
            self.only_methods.as_slice(),
            self.except_methods.as_slice(),
        )?;

        Ok(MiddlewareOptions {
            enabled: self.enabled,
            priority: self.priority,
            filter,
            settings: self.settings.clone(),
        })
    }

    /// `settings` 를 미들웨어 고유 설정 구조체로 변환합니다.
    pub fn typed_settings<T: DeserializeOwned>(&self) -> Result<T, MiddlewareError> {
        serde_json::from_value(Value::Object(self.settings.clone())).map_err(|e| {
            MiddlewareError::Config(format!("{:?} 설정 파싱 실패: {}", self.middleware_type, e))
        })
    }
}

/// 경로/메서드 기반 실행 조건
///
/// 설정된 모든 조건을 통과해야 실행됩니다.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    only_paths: Vec<GlobPattern>,
    except_paths: Vec<GlobPattern>,
    only_methods: Vec<String>,
    except_methods: Vec<String>,
}

impl RequestFilter {
    pub fn new<S: AsRef<str>>(
        only_paths: &[S],
        except_paths: &[S],
        only_methods: &[S],
        except_methods: &[S],
    ) -> Result<Self, MiddlewareError> {
        Ok(Self {
            only_paths: compile_patterns(only_paths)?,
            except_paths: compile_patterns(except_paths)?,
            only_methods: normalize_methods(only_methods),
            except_methods: normalize_methods(except_methods),
        })
    }

    pub fn allows(&self, path: &str, method: &str) -> bool {
        if !self.only_paths.is_empty() && !matches_any(&self.only_paths, path) {
            return false;
        }
        if matches_any(&self.except_paths, path) {
            return false;
        }

        let method = method.to_ascii_uppercase();
        if !self.only_methods.is_empty() && !self.only_methods.contains(&method) {
            return false;
        }
        !self.except_methods.contains(&method)
    }
}

fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<GlobPattern>, MiddlewareError> {
    patterns.iter().map(|p| GlobPattern::new(p.as_ref())).collect()
}

fn normalize_methods<S: AsRef<str>>(methods: &[S]) -> Vec<String> {
    methods
        .iter()
        .map(|m| m.as_ref().trim().to_ascii_uppercase())
        .collect()
}

/// 모든 미들웨어가 공유하는 실행 시점 옵션
#[derive(Debug, Clone)]
pub struct MiddlewareOptions {
    enabled: bool,
    priority: Option<i32>,
    filter: RequestFilter,
    settings: Map<String, Value>,
}

impl Default for MiddlewareOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: None,
            filter: RequestFilter::default(),
            settings: Map::new(),
        }
    }
}

impl MiddlewareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_filter(mut self, filter: RequestFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_settings(mut self, settings: Map<String, Value>) -> Self {
        self.settings = settings;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = Some(priority);
    }

    pub fn filter(&self) -> &RequestFilter {
        &self.filter
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    /// 점(.)으로 구분된 경로로 설정값을 찾습니다. 예: `headers.max_count`
    pub fn get_setting(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.settings.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// 값이 없거나 타입이 맞지 않으면 기본값을 돌려줍니다.
    pub fn setting_or<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        self.get_setting(path)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(default)
    }

    /// 점 경로에 값을 저장합니다. 중간 객체가 없으면 새로 만듭니다.
    pub fn set_setting(&mut self, path: &str, value: Value) {
        let parts: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = parts.split_last() else {
            return;
        };

        let mut current = &mut self.settings;
        for part in parents {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry.as_object_mut() {
                Some(map) => map,
                None => return,
            };
        }
        current.insert(last.to_string(), value);
    }
}
