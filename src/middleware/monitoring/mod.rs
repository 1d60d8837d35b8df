//! 성능 모니터링 미들웨어
//!
//! 요청마다 측정 구간을 열고 응답 또는 에러 단계에서 닫으며,
//! 엔드포인트 템플릿 기준으로 지표를 기록합니다.

mod config;
pub mod endpoint;
pub mod memory;
mod middleware;
mod recorder;

pub use config::MonitoringConfig;
pub use memory::MemorySnapshot;
pub use middleware::{
    MonitoringMiddleware, MEMORY_PEAK_HEADER, MEMORY_USAGE_HEADER, REQUEST_ID_HEADER,
    RESPONSE_TIME_HEADER,
};
pub use recorder::{InMemoryRecorder, MetricsRecorder, Tags, TracingRecorder};
