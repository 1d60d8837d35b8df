use crate::support::{journal, request, CapturingSink, MockTransport, OnError, Probe};
use serde_json::json;
use std::sync::Arc;
use stock_api_pipeline::client::ApiClient;
use stock_api_pipeline::middleware::{
    LoggingConfig, LoggingMiddleware, MiddlewareCategory, MiddlewareError, Pipeline,
    PipelineConfig,
};

#[tokio::test]
async fn test_execute_runs_all_phases() {
    let log = journal();
    let sink = Arc::new(CapturingSink::default());
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("transform", MiddlewareCategory::Transformation, &log))
        .add(LoggingMiddleware::new(LoggingConfig::default(), sink.clone()).unwrap());

    let transport = Arc::new(MockTransport::responding(200, json!({"symbol": "AAPL", "price": 1.0})));
    let client = ApiClient::new(pipeline, transport.clone());

    let res = client
        .execute(request("GET", "/v2/stocks/quote/AAPL"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-probe-transform"));
    assert_eq!(*log.lock(), vec!["transform:request", "transform:response"]);

    // 전송 계층은 변환된 요청을 받음
    let sent = transport.sent.lock();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].headers().contains_key("x-probe-transform"));

    let (_, record) = sink.find("HTTP Response").unwrap();
    assert!(record.contains_key("duration_ms"));
}

#[tokio::test]
async fn test_transport_failure_goes_through_error_phase() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline.add(Probe::new("monitor", MiddlewareCategory::Monitoring, &log));

    let client = ApiClient::new(pipeline, Arc::new(MockTransport::failing()));
    let err = client
        .execute(request("GET", "/v2/news"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "TransportError");
    assert_eq!(err.code(), 502);
    assert_eq!(*log.lock(), vec!["monitor:request", "monitor:error"]);
}

#[tokio::test]
async fn test_suppressed_error_yields_none() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline.add(Probe::new("monitor", MiddlewareCategory::Monitoring, &log).on_error(OnError::Suppress));

    let client = ApiClient::new(pipeline, Arc::new(MockTransport::failing()));
    let outcome = client.execute(request("GET", "/v2/news")).await.unwrap();
    assert!(outcome.is_none());
}

#[tokio::test]
async fn test_request_phase_failure_skips_transport() {
    let log = journal();
    let mut pipeline = Pipeline::new(PipelineConfig {
        fail_fast: true,
        ..Default::default()
    });
    pipeline
        .add(Probe::new("guard", MiddlewareCategory::Security, &log).failing())
        .add(Probe::new("logging", MiddlewareCategory::Logging, &log));

    let transport = Arc::new(MockTransport::responding(200, json!({})));
    let client = ApiClient::new(pipeline, transport.clone());
    let err = client
        .execute(request("GET", "/v2/news"))
        .await
        .unwrap_err();

    assert!(matches!(err, MiddlewareError::Execution { .. }));
    assert!(transport.sent.lock().is_empty());
    assert_eq!(*log.lock(), vec!["guard:request", "logging:error"]);
}

#[tokio::test]
async fn test_pipeline_swap_applies_to_next_request() {
    let log = journal();
    let client = ApiClient::new(
        Pipeline::default(),
        Arc::new(MockTransport::responding(200, json!({}))),
    );
    client.execute(request("GET", "/v2/news")).await.unwrap();
    assert!(log.lock().is_empty());

    let mut replacement = Pipeline::default();
    replacement.add(Probe::new("late", MiddlewareCategory::Logging, &log));
    client.pipeline().replace(replacement).await;

    client.execute(request("GET", "/v2/news")).await.unwrap();
    assert_eq!(*log.lock(), vec!["late:request", "late:response"]);
}
