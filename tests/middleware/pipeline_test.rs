use crate::support::{journal, json_response, request, OnError, Probe};
use serde_json::json;
use stock_api_pipeline::middleware::pattern::GlobPattern;
use stock_api_pipeline::middleware::{
    Middleware, MiddlewareCategory, MiddlewareError, MiddlewareOptions, Pipeline, PipelineConfig,
    RequestContext, RequestFilter, SharedPipeline,
};

fn fail_fast(enabled: bool) -> PipelineConfig {
    PipelineConfig {
        fail_fast: enabled,
        ..Default::default()
    }
}

#[test]
fn test_priority_order_with_ties() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("log-a", MiddlewareCategory::Logging, &log))
        .add(Probe::new("monitor", MiddlewareCategory::Monitoring, &log))
        .add(
            Probe::new("log-b", MiddlewareCategory::Transformation, &log)
                .with_options(MiddlewareOptions::new().with_priority(500)),
        )
        .add(Probe::new("schema", MiddlewareCategory::Validation, &log));

    let order: Vec<&str> = pipeline.middleware().iter().map(|m| m.name()).collect();
    assert_eq!(order, vec!["monitor", "log-a", "log-b", "schema"]);

    let priorities: Vec<i32> = pipeline.middleware().iter().map(|m| m.priority()).collect();
    assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_set_priority_resorts() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("first", MiddlewareCategory::Logging, &log))
        .add(Probe::new("second", MiddlewareCategory::Logging, &log));

    assert!(pipeline.set_priority("second", 600));
    assert!(!pipeline.set_priority("missing", 1));

    let order: Vec<&str> = pipeline.middleware().iter().map(|m| m.name()).collect();
    assert_eq!(order, vec!["second", "first"]);
}

#[tokio::test]
async fn test_request_phase_order_and_transform() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("logging", MiddlewareCategory::Logging, &log))
        .add(Probe::new("security", MiddlewareCategory::Security, &log))
        .add(Probe::new("schema", MiddlewareCategory::Validation, &log));

    let req = pipeline
        .process_request(request("GET", "/v2/stocks/quote/AAPL"), &RequestContext::new())
        .await
        .unwrap();

    // 검증 미들웨어는 요청 단계에 참여하지 않음
    assert_eq!(*log.lock(), vec!["security:request", "logging:request"]);
    assert!(req.headers().contains_key("x-probe-security"));
    assert!(req.headers().contains_key("x-probe-logging"));
    assert!(!req.headers().contains_key("x-probe-schema"));
    assert_eq!(pipeline.metrics().len(), 1);
}

#[tokio::test]
async fn test_disabled_middleware_never_executes() {
    let log = journal();
    let allow_all = RequestFilter::new(&["/v2/*"], &[] as &[&str], &["GET"], &[]).unwrap();
    let disabled = MiddlewareOptions::new()
        .with_enabled(false)
        .with_filter(allow_all);
    let probe = Probe::new("off", MiddlewareCategory::Logging, &log).with_options(disabled);

    let req = request("GET", "/v2/news");
    let ctx = RequestContext::new();
    assert!(!probe.should_execute(&req, &ctx));

    let mut pipeline = Pipeline::default();
    pipeline.add(probe);
    pipeline.process_request(req, &ctx).await.unwrap();
    let res = pipeline
        .process_response(json_response(200, json!({})), &request("GET", "/v2/news"), &ctx)
        .await
        .unwrap();

    assert!(log.lock().is_empty());
    assert!(!res.headers().contains_key("x-probe-off"));
    assert!(pipeline.request_middleware().is_empty());
}

#[tokio::test]
async fn test_filters_gate_execution() {
    let log = journal();
    let filter = RequestFilter::new(
        &["/v2/stocks/*"],
        &["/v2/stocks/internal*"],
        &[] as &[&str],
        &["DELETE"],
    )
        .unwrap();
    let mut pipeline = Pipeline::default();
    pipeline.add(
        Probe::new("stocks", MiddlewareCategory::Logging, &log)
            .with_options(MiddlewareOptions::new().with_filter(filter)),
    );

    let ctx = RequestContext::new();
    for (method, path) in [
        ("GET", "/v2/stocks/quote/AAPL"),
        ("GET", "/v2/news/AAPL"),
        ("GET", "/v2/stocks/internal/debug"),
        ("delete", "/v2/stocks/quote/AAPL"),
    ] {
        pipeline.process_request(request(method, path), &ctx).await.unwrap();
    }

    assert_eq!(*log.lock(), vec!["stocks:request"]);
}

#[test]
fn test_glob_matching() {
    let stocks = GlobPattern::new("/v2/stocks/*").unwrap();
    assert!(stocks.matches("/v2/stocks/quote"));
    assert!(stocks.matches("/v2/stocks/timeline/AAPL"));
    assert!(!stocks.matches("/v2/news/AAPL"));

    let single = GlobPattern::new("/v2/stocks/quote?").unwrap();
    assert!(single.matches("/v2/stocks/quotex"));
    assert!(!single.matches("/v2/stocks/quote"));
    assert!(!single.matches("/v2/stocks/quotexy"));

    let literal = GlobPattern::new("/v2/stocks/quote.json").unwrap();
    assert!(!literal.matches("/v2/stocks/quoteXjson"));
}

#[tokio::test]
async fn test_response_unchanged_without_response_middleware() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("security", MiddlewareCategory::Security, &log))
        .add(Probe::new("retry", MiddlewareCategory::Retry, &log));

    let original = json_response(201, json!({"symbol": "AAPL", "price": 189.5}));
    let expected_status = original.status();
    let expected_headers = original.headers().clone();
    let expected_body = original.body().clone();

    let res = pipeline
        .process_response(original, &request("GET", "/v2/stocks/quote/AAPL"), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(res.status(), expected_status);
    assert_eq!(res.headers(), &expected_headers);
    assert_eq!(res.body(), &expected_body);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_metrics_retain_most_recent() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline.add(Probe::new("logging", MiddlewareCategory::Logging, &log));

    let ctx = RequestContext::new();
    for _ in 0..101 {
        pipeline
            .process_request(request("GET", "/v2/news"), &ctx)
            .await
            .unwrap();
    }

    assert_eq!(pipeline.metrics().len(), 50);
    let stats = pipeline.statistics();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.recorded_executions, 50);
    assert_eq!(stats.timing.map(|t| t.count), Some(50));
}

#[tokio::test]
async fn test_fail_fast_aborts_and_surfaces_error() {
    let log = journal();
    let mut pipeline = Pipeline::new(fail_fast(true));
    pipeline
        .add(Probe::new("monitor", MiddlewareCategory::Monitoring, &log))
        .add(Probe::new("broken", MiddlewareCategory::Logging, &log).failing())
        .add(Probe::new("transform", MiddlewareCategory::Transformation, &log));

    let result = pipeline
        .process_request(request("GET", "/v2/news"), &RequestContext::new())
        .await;

    match result {
        Err(MiddlewareError::Execution { middleware, .. }) => assert_eq!(middleware, "broken"),
        other => panic!("expected execution error, got {:?}", other.map(|_| ())),
    }
    assert_eq!(*log.lock(), vec!["monitor:request", "broken:request"]);
    assert!(pipeline.metrics().is_empty());
}

#[tokio::test]
async fn test_fail_soft_returns_partial_request() {
    let log = journal();
    let mut pipeline = Pipeline::new(fail_fast(false));
    pipeline
        .add(Probe::new("monitor", MiddlewareCategory::Monitoring, &log))
        .add(Probe::new("broken", MiddlewareCategory::Logging, &log).failing())
        .add(Probe::new("transform", MiddlewareCategory::Transformation, &log));

    let req = pipeline
        .process_request(request("GET", "/v2/news"), &RequestContext::new())
        .await
        .unwrap();

    assert!(req.headers().contains_key("x-probe-monitor"));
    assert!(!req.headers().contains_key("x-probe-transform"));
    assert_eq!(*log.lock(), vec!["monitor:request", "broken:request"]);
    assert_eq!(pipeline.metrics().len(), 1);
}

#[tokio::test]
async fn test_fail_soft_response_phase() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("broken", MiddlewareCategory::Monitoring, &log).failing())
        .add(Probe::new("logging", MiddlewareCategory::Logging, &log));

    let res = pipeline
        .process_response(
            json_response(200, json!({})),
            &request("GET", "/v2/news"),
            &RequestContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(*log.lock(), vec!["broken:response"]);
}

#[tokio::test]
async fn test_error_replaced_by_middleware() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("monitor", MiddlewareCategory::Monitoring, &log).on_error(OnError::Replace("upstream down")))
        .add(Probe::new("logging", MiddlewareCategory::Logging, &log));

    let err = pipeline
        .handle_error(
            MiddlewareError::Timeout(std::time::Duration::from_secs(1)),
            &request("GET", "/v2/news"),
            &RequestContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(err.kind(), "TransportError");
    assert_eq!(*log.lock(), vec!["monitor:error", "logging:error"]);
}

#[tokio::test]
async fn test_error_suppressed_stops_chain() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("monitor", MiddlewareCategory::Monitoring, &log).on_error(OnError::Suppress))
        .add(Probe::new("logging", MiddlewareCategory::Logging, &log));

    let surfaced = pipeline
        .handle_error(
            MiddlewareError::Transport("reset".to_string()),
            &request("GET", "/v2/news"),
            &RequestContext::new(),
        )
        .await;

    assert!(surfaced.is_none());
    assert_eq!(*log.lock(), vec!["monitor:error"]);
}

#[tokio::test]
async fn test_failing_error_handler_under_fail_fast_keeps_original() {
    let log = journal();
    let mut pipeline = Pipeline::new(fail_fast(true));
    pipeline
        .add(Probe::new("monitor", MiddlewareCategory::Monitoring, &log).on_error(OnError::Fail))
        .add(Probe::new("logging", MiddlewareCategory::Logging, &log));

    let err = pipeline
        .handle_error(
            MiddlewareError::Transport("reset".to_string()),
            &request("GET", "/v2/news"),
            &RequestContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(err.kind(), "WrappedError");
    assert_eq!(err.root_cause().kind(), "TransportError");
    assert!(err.to_string().contains("monitor"));
    assert_eq!(*log.lock(), vec!["monitor:error"]);
}

#[tokio::test]
async fn test_failing_error_handler_under_fail_soft_is_skipped() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("monitor", MiddlewareCategory::Monitoring, &log).on_error(OnError::Fail))
        .add(Probe::new("logging", MiddlewareCategory::Logging, &log));

    let err = pipeline
        .handle_error(
            MiddlewareError::Transport("reset".to_string()),
            &request("GET", "/v2/news"),
            &RequestContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(err.kind(), "TransportError");
    assert_eq!(*log.lock(), vec!["monitor:error", "logging:error"]);
}

#[tokio::test]
async fn test_disabled_pipeline_passes_through() {
    let log = journal();
    let mut pipeline = Pipeline::new(PipelineConfig {
        enabled: false,
        ..Default::default()
    });
    pipeline.add(Probe::new("logging", MiddlewareCategory::Logging, &log));

    let ctx = RequestContext::new();
    let req = pipeline
        .process_request(request("GET", "/v2/news"), &ctx)
        .await
        .unwrap();
    let err = pipeline
        .handle_error(MiddlewareError::Transport("x".to_string()), &req, &ctx)
        .await;

    assert!(log.lock().is_empty());
    assert!(err.is_some());
    assert!(pipeline.metrics().is_empty());
}

#[test]
fn test_membership_and_removal() {
    let log = journal();
    let mut pipeline = Pipeline::default();
    pipeline
        .add(Probe::new("a", MiddlewareCategory::Logging, &log))
        .add(Probe::new("b", MiddlewareCategory::Logging, &log))
        .add(Probe::new("c", MiddlewareCategory::Monitoring, &log));

    assert!(pipeline.has_middleware::<Probe>());
    assert!(pipeline.has_category(MiddlewareCategory::Logging));
    assert!(!pipeline.has_category(MiddlewareCategory::Caching));

    let stats = pipeline.statistics();
    assert_eq!(stats.by_category.get(&MiddlewareCategory::Logging), Some(&2));
    assert_eq!(stats.by_phase.error, 3);

    pipeline.disable_all();
    assert_eq!(pipeline.statistics().enabled, 0);
    pipeline.enable_all();
    assert!(pipeline.set_enabled("c", false));
    assert_eq!(pipeline.error_middleware().len(), 2);

    assert_eq!(pipeline.remove_category(MiddlewareCategory::Logging), 2);
    assert!(pipeline.remove("c").is_some());
    assert!(pipeline.remove("c").is_none());
    assert!(pipeline.is_empty());
}

#[tokio::test]
async fn test_shared_pipeline_swap_keeps_snapshot() {
    let log = journal();
    let mut first = Pipeline::default();
    first.add(Probe::new("old", MiddlewareCategory::Logging, &log));
    let shared = SharedPipeline::new(first);

    let held = shared.snapshot().await;
    let mut second = Pipeline::default();
    second.add(Probe::new("new", MiddlewareCategory::Logging, &log));
    let previous = shared.replace(second).await;

    assert!(held.get("old").is_some());
    assert!(previous.get("old").is_some());
    assert!(shared.snapshot().await.get("new").is_some());
}
