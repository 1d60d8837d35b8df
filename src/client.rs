//! 파이프라인을 거쳐 HTTP 요청을 보내는 클라이언트

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::middleware::{
    MiddlewareError, Pipeline, Request, RequestContext, Response, SharedPipeline,
};

/// 실제 네트워크 전송 계층
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, MiddlewareError>;
}

/// hyper 기반 전송 계층
#[derive(Clone)]
pub struct HyperTransport {
    client: legacy::Client<HttpConnector, Full<Bytes>>,
    timeout: Option<Duration>,
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransport {
    pub fn new() -> Self {
        let connector = HttpConnector::new();
        let client = legacy::Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(connector);
        Self {
            client,
            timeout: None,
        }
    }

    /// 요청 전송부터 본문 수신까지의 전체 제한 시간
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn round_trip(&self, request: &Request) -> Result<Response, MiddlewareError> {
        let mut builder = hyper::Request::builder()
            .method(request.method().clone())
            .uri(request.uri().clone())
            .version(request.version());
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }
        let outbound = builder.body(Full::new(request.body().clone()))?;

        let response = self
            .client
            .request(outbound)
            .await
            .map_err(|e| MiddlewareError::Transport(format!("Backend request failed: {}", e)))?;

        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| {
                MiddlewareError::Transport(format!("Failed to collect response body: {}", e))
            })?
            .to_bytes();
        debug!(bytes_size = bytes.len(), "Response body collected");

        Ok(Response::from_parts(parts, bytes))
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: &Request) -> Result<Response, MiddlewareError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.round_trip(request))
                .await
                .map_err(|_| MiddlewareError::Timeout(limit))?,
            None => self.round_trip(request).await,
        }
    }
}

/// 요청 → 요청 단계 → 전송 → 응답 단계 순서로 호출을 수행하는 클라이언트
pub struct ApiClient {
    pipeline: SharedPipeline,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(pipeline: Pipeline, transport: Arc<dyn Transport>) -> Self {
        Self {
            pipeline: SharedPipeline::new(pipeline),
            transport,
        }
    }

    /// 실행 중인 요청에 영향을 주지 않고 파이프라인을 교체할 수 있습니다.
    pub fn pipeline(&self) -> &SharedPipeline {
        &self.pipeline
    }

    /// 요청을 실행합니다.
    ///
    /// 에러 단계에서 미들웨어가 에러를 삼킨 경우 `Ok(None)` 을 돌려줍니다.
    #[instrument(skip_all, fields(method = %request.method(), uri = %request.uri()))]
    pub async fn execute(&self, request: Request) -> Result<Option<Response>, MiddlewareError> {
        self.execute_with_context(request, RequestContext::new())
            .await
    }

    pub async fn execute_with_context(
        &self,
        request: Request,
        mut ctx: RequestContext,
    ) -> Result<Option<Response>, MiddlewareError> {
        let pipeline = self.pipeline.snapshot().await;
        let original = duplicate_request(&request);

        let request = match pipeline.process_request(request, &ctx).await {
            Ok(request) => request,
            Err(e) => return Self::surface(&pipeline, e, &original, &ctx).await,
        };

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(request_id = %ctx.request_id(), error = %e, "전송 실패");
                return Self::surface(&pipeline, e, &request, &ctx).await;
            }
        };
        ctx.mark_completed();

        match pipeline.process_response(response, &request, &ctx).await {
            Ok(response) => {
                info!(
                    request_id = %ctx.request_id(),
                    status = response.status().as_u16(),
                    "요청 완료"
                );
                Ok(Some(response))
            }
            Err(e) => Self::surface(&pipeline, e, &request, &ctx).await,
        }
    }

    async fn surface(
        pipeline: &Pipeline,
        error: MiddlewareError,
        request: &Request,
        ctx: &RequestContext,
    ) -> Result<Option<Response>, MiddlewareError> {
        match pipeline.handle_error(error, request, ctx).await {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// 요청 단계가 실패했을 때 에러 단계에 넘길 원본 요청의 사본
fn duplicate_request(request: &Request) -> Request {
    let mut copy = hyper::Request::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    copy
}
