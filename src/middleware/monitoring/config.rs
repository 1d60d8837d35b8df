use serde::{Deserialize, Serialize};

use crate::middleware::MiddlewareError;

/// 성능 모니터링 미들웨어 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// 요청 단위 샘플링 비율 (0.0 ~ 1.0)
    pub sample_rate: f64,
    pub add_monitoring_headers: bool,
    pub slow_request_ms: u64,
    pub large_response_bytes: usize,
    /// 닫히지 않은 측정 구간을 버리기까지의 시간
    pub max_span_age_ms: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sample_rate: 1.0,
            add_monitoring_headers: false,
            slow_request_ms: 5000,
            large_response_bytes: 1024 * 1024,
            max_span_age_ms: 300_000,
        }
    }
}

impl MonitoringConfig {
    pub fn validate(&self) -> Result<(), MiddlewareError> {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(MiddlewareError::Config(format!(
                "sample_rate는 0과 1 사이여야 합니다: {}",
                self.sample_rate
            )));
        }
        if self.max_span_age_ms == 0 {
            return Err(MiddlewareError::Config(
                "max_span_age_ms 는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}
