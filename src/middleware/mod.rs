use bytes::Bytes;

pub mod category;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod monitoring;
pub mod pattern;
pub mod pipeline;
pub mod traits;
pub mod validation;

pub use category::{MiddlewareCategory, Phase};
pub use config::{MiddlewareConfig, MiddlewareOptions, MiddlewareType, RequestFilter};
pub use context::RequestContext;
pub use error::MiddlewareError;
pub use logging::{LoggingConfig, LoggingMiddleware};
pub use manager::{build_pipeline, Collaborators};
pub use metrics::{ExecutionMetric, MetricsLog, MiddlewareTiming, TimingSummary};
pub use monitoring::{MonitoringConfig, MonitoringMiddleware};
pub use pipeline::{Pipeline, PipelineConfig, PipelineStatistics, SharedPipeline};
pub use traits::{ErrorAction, Middleware};
pub use validation::{ValidationConfig, ValidationMiddleware};

pub type Request = hyper::Request<Bytes>;
pub type Response = hyper::Response<Bytes>;
