use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// 하나의 논리적 요청에 대한 부가 정보
///
/// 요청 ID는 요청마다 한 번만 생성되어 요청/응답/에러 단계 전체에 전달됩니다.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    started_at: Instant,
    duration: Option<Duration>,
    attributes: HashMap<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_request_id(Uuid::new_v4().to_string())
    }

    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            started_at: Instant::now(),
            duration: None,
            attributes: HashMap::new(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// 전송 계층이 측정한 소요 시간. 없으면 None.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = Some(duration);
    }

    /// 컨텍스트 생성 이후 흐른 시간으로 소요 시간을 기록합니다.
    pub fn mark_completed(&mut self) {
        self.duration = Some(self.started_at.elapsed());
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn insert_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
