//! 주식 API 클라이언트용 미들웨어 파이프라인입니다.
//!
//! 요청 전송 전, 응답 수신 후, 에러 발생 시점에 우선순위 순서로 미들웨어를 실행합니다.
//!
//! # 주요 기능
//!
//! - 분류별 기본 우선순위와 단계(요청/응답/에러) 게이트
//! - 경로/메서드 패턴 기반 실행 필터
//! - fail-fast / fail-soft 실패 정책과 실행 메트릭
//! - 로깅, 응답 스키마 검증, 성능 모니터링 미들웨어
//!
//! # 예제
//!
//! ```
//! use std::sync::Arc;
//! use stock_api_pipeline::logging::TracingLogSink;
//! use stock_api_pipeline::middleware::{
//!     LoggingConfig, LoggingMiddleware, Pipeline, PipelineConfig, RequestContext,
//! };
//!
//! # tokio_test_block(async {
//! let mut pipeline = Pipeline::new(PipelineConfig::default());
//! pipeline.add(LoggingMiddleware::new(LoggingConfig::default(), Arc::new(TracingLogSink)).unwrap());
//!
//! let ctx = RequestContext::new();
//! let request = hyper::Request::builder()
//!     .uri("/v2/stocks/quote/AAPL")
//!     .body(bytes::Bytes::new())
//!     .unwrap();
//! let request = pipeline.process_request(request, &ctx).await.unwrap();
//! assert_eq!(request.uri().path(), "/v2/stocks/quote/AAPL");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod client;
pub mod logging;
pub mod middleware;
pub mod settings;
