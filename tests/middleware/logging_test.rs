use crate::support::{json_response, request, CapturingSink};
use bytes::Bytes;
use serde_json::json;
use std::sync::Arc;
use stock_api_pipeline::logging::LogLevel;
use stock_api_pipeline::middleware::logging::redact::REDACTED;
use stock_api_pipeline::middleware::{
    LoggingConfig, LoggingMiddleware, MiddlewareError, Pipeline, RequestContext,
};

fn logging_pipeline(config: LoggingConfig) -> (Pipeline, Arc<CapturingSink>) {
    let sink = Arc::new(CapturingSink::default());
    let mut pipeline = Pipeline::default();
    pipeline.add(LoggingMiddleware::new(config, sink.clone()).unwrap());
    (pipeline, sink)
}

#[tokio::test]
async fn test_authorization_header_redacted() {
    let config = LoggingConfig {
        sensitive_headers: vec!["Authorization".to_string()],
        ..Default::default()
    };
    let (pipeline, sink) = logging_pipeline(config);

    let req = hyper::Request::builder()
        .method("GET")
        .uri("/v2/stocks/quote/AAPL")
        .header("Authorization", "Bearer abc123")
        .header("Accept", "application/json")
        .body(Bytes::new())
        .unwrap();

    let req = pipeline
        .process_request(req, &RequestContext::new())
        .await
        .unwrap();

    let (level, record) = sink.find("HTTP Request").unwrap();
    assert_eq!(level, LogLevel::Info);
    assert_eq!(record["headers"]["authorization"], REDACTED);
    assert_eq!(record["headers"]["accept"], "application/json");
    assert_eq!(record["method"], "GET");
    assert_eq!(record["uri"], "/v2/stocks/quote/AAPL");

    // 실제 요청은 변경되지 않음
    assert_eq!(req.headers()["authorization"], "Bearer abc123");
}

#[tokio::test]
async fn test_request_body_fields_masked_and_truncated() {
    let config = LoggingConfig {
        log_request_body: true,
        ..Default::default()
    };
    let (pipeline, sink) = logging_pipeline(config);

    let body = json!({"symbol": "AAPL", "api_key": "secret-key", "nested": {"password": "p"}});
    let req = hyper::Request::builder()
        .method("POST")
        .uri("/v2/orders")
        .body(Bytes::from(body.to_string()))
        .unwrap();
    pipeline
        .process_request(req, &RequestContext::new())
        .await
        .unwrap();

    let (_, record) = sink.find("HTTP Request").unwrap();
    assert_eq!(record["body"]["symbol"], "AAPL");
    assert_eq!(record["body"]["api_key"], REDACTED);
    assert_eq!(record["body"]["nested"]["password"], REDACTED);

    let config = LoggingConfig {
        log_request_body: true,
        max_body_length: 10,
        ..Default::default()
    };
    let (pipeline, sink) = logging_pipeline(config);
    let req = hyper::Request::builder()
        .method("POST")
        .uri("/v2/orders")
        .body(Bytes::from_static(b"plain text body that is long"))
        .unwrap();
    pipeline
        .process_request(req, &RequestContext::new())
        .await
        .unwrap();

    let (_, record) = sink.find("HTTP Request").unwrap();
    let excerpt = record["body"].as_str().unwrap();
    assert!(excerpt.starts_with("plain text"));
    assert!(excerpt.ends_with("... (truncated)"));
}

#[tokio::test]
async fn test_large_json_body_respects_max_length() {
    let config = LoggingConfig {
        log_request_body: true,
        max_body_length: 10,
        ..Default::default()
    };
    let (pipeline, sink) = logging_pipeline(config);

    let items: Vec<_> = (0..2000)
        .map(|i| json!({"symbol": format!("SYM{}", i), "price": i}))
        .collect();
    let body = json!({"api_key": "secret-key", "items": items}).to_string();
    assert!(body.len() > 50_000);

    let req = hyper::Request::builder()
        .method("POST")
        .uri("/v2/stocks/batch")
        .body(Bytes::from(body))
        .unwrap();
    pipeline
        .process_request(req, &RequestContext::new())
        .await
        .unwrap();

    let (_, record) = sink.find("HTTP Request").unwrap();
    let excerpt = record["body"].as_str().unwrap();
    assert_eq!(excerpt.chars().count(), 10 + "... (truncated)".len());
    assert!(excerpt.ends_with("... (truncated)"));
    assert!(!excerpt.contains("secret-key"));
}

#[tokio::test]
async fn test_response_level_follows_status() {
    let (pipeline, sink) = logging_pipeline(LoggingConfig::default());
    let mut ctx = RequestContext::new();
    ctx.mark_completed();
    let req = request("GET", "/v2/news");

    for status in [200, 404, 503] {
        pipeline
            .process_response(json_response(status, json!({"error": "x"})), &req, &ctx)
            .await
            .unwrap();
    }

    let levels: Vec<LogLevel> = sink
        .records()
        .into_iter()
        .filter(|(_, message, _)| message == "HTTP Response")
        .map(|(level, _, _)| level)
        .collect();
    assert_eq!(levels, vec![LogLevel::Info, LogLevel::Warning, LogLevel::Error]);

    let (_, record) = sink.find("HTTP Response").unwrap();
    assert_eq!(record["status"], 200);
    assert_eq!(record["request_uri"], "/v2/news");
    assert!(record.contains_key("duration_ms"));
    assert!(!record.contains_key("headers"));
}

#[tokio::test]
async fn test_error_recorded_with_trace() {
    let config = LoggingConfig {
        log_stack_trace: true,
        ..Default::default()
    };
    let (pipeline, sink) = logging_pipeline(config);
    let ctx = RequestContext::with_request_id("req-42");

    let err = MiddlewareError::Transport("connection reset".to_string()).wrap("quote 요청 실패");
    let surfaced = pipeline
        .handle_error(err, &request("GET", "/v2/stocks/quote/AAPL"), &ctx)
        .await
        .unwrap();
    assert_eq!(surfaced.kind(), "WrappedError");

    let (level, record) = sink.find("HTTP Error").unwrap();
    assert_eq!(level, LogLevel::Error);
    assert_eq!(record["request_id"], "req-42");
    assert_eq!(record["error_class"], "WrappedError");
    assert_eq!(record["code"], 502);
    assert_eq!(record["trace"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_disabled_flags_skip_records() {
    let config = LoggingConfig {
        log_requests: false,
        log_errors: false,
        ..Default::default()
    };
    let (pipeline, sink) = logging_pipeline(config);
    let ctx = RequestContext::new();

    let req = pipeline
        .process_request(request("GET", "/v2/news"), &ctx)
        .await
        .unwrap();
    pipeline
        .handle_error(MiddlewareError::Processing("x".to_string()), &req, &ctx)
        .await;

    assert!(sink.records().is_empty());
}

#[test]
fn test_zero_body_length_rejected() {
    let config = LoggingConfig {
        max_body_length: 0,
        ..Default::default()
    };
    let result = LoggingMiddleware::new(config, Arc::new(CapturingSink::default()));
    assert!(matches!(result, Err(MiddlewareError::Config(_))));
}
