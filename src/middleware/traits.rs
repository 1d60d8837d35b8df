use super::{
    MiddlewareCategory, MiddlewareError, MiddlewareOptions, Request, RequestContext, Response,
};
use async_trait::async_trait;
use std::any::Any;

/// 구체 타입 조회를 위한 보조 트레이트
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 에러 단계에서 미들웨어가 내리는 결정
#[derive(Debug)]
pub enum ErrorAction {
    /// 현재 에러를 그대로 다음 미들웨어로 넘깁니다.
    Propagate,
    /// 다른 에러로 교체합니다.
    Replace(MiddlewareError),
    /// 에러를 삼킵니다. 이후 미들웨어와 호출자는 에러를 보지 못합니다.
    Suppress,
}

/// 미들웨어 트레이트
///
/// 요청 전송 전, 응답 수신 후, 그리고 에러 발생 시점에 개입하는 인터페이스입니다.
/// 단계별 게이트(분류의 단계 플래그)와 경로/메서드 필터는 기본 구현이 처리하므로
/// 구현체는 보통 `on_request`, `on_response`, `on_error` 만 재정의합니다.
#[async_trait]
pub trait Middleware: AsAny + Send + Sync {
    /// 미들웨어의 고유 이름을 반환합니다.
    fn name(&self) -> &str;

    fn category(&self) -> MiddlewareCategory;

    fn options(&self) -> &MiddlewareOptions;

    fn options_mut(&mut self) -> &mut MiddlewareOptions;

    /// 실효 우선순위. 명시적으로 지정하지 않았다면 분류의 기본값.
    fn priority(&self) -> i32 {
        self.options()
            .priority()
            .unwrap_or_else(|| self.category().priority())
    }

    fn set_priority(&mut self, priority: i32) {
        self.options_mut().set_priority(priority);
    }

    fn is_enabled(&self) -> bool {
        self.options().is_enabled()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.options_mut().set_enabled(enabled);
    }

    /// 이 요청에 대해 실행할지 결정합니다.
    fn should_execute(&self, req: &Request, ctx: &RequestContext) -> bool {
        let options = self.options();
        if !options.is_enabled() {
            return false;
        }
        if !options.filter().allows(req.uri().path(), req.method().as_str()) {
            return false;
        }
        self.custom_should_execute(req, ctx)
    }

    /// 구현체별 추가 실행 조건
    fn custom_should_execute(&self, _req: &Request, _ctx: &RequestContext) -> bool {
        true
    }

    /// HTTP 요청을 처리합니다.
    async fn process_request(
        &self,
        req: &mut Request,
        ctx: &RequestContext,
    ) -> Result<(), MiddlewareError> {
        if !self.category().is_request_phase() {
            return Ok(());
        }
        self.on_request(req, ctx).await
    }

    /// HTTP 응답을 처리합니다.
    async fn process_response(
        &self,
        res: &mut Response,
        req: &Request,
        ctx: &RequestContext,
    ) -> Result<(), MiddlewareError> {
        if !self.category().is_response_phase() {
            return Ok(());
        }
        self.on_response(res, req, ctx).await
    }

    /// 에러를 관찰하거나 교체합니다.
    ///
    /// `Err` 는 에러 처리 자체가 실패한 경우입니다. 원래 에러는 파이프라인이 보관합니다.
    async fn handle_error(
        &self,
        err: &MiddlewareError,
        req: &Request,
        ctx: &RequestContext,
    ) -> Result<ErrorAction, MiddlewareError> {
        if !self.category().is_error_phase() {
            return Ok(ErrorAction::Propagate);
        }
        self.on_error(err, req, ctx).await
    }

    async fn on_request(
        &self,
        _req: &mut Request,
        _ctx: &RequestContext,
    ) -> Result<(), MiddlewareError> {
        Ok(())
    }

    async fn on_response(
        &self,
        _res: &mut Response,
        _req: &Request,
        _ctx: &RequestContext,
    ) -> Result<(), MiddlewareError> {
        Ok(())
    }

    async fn on_error(
        &self,
        _err: &MiddlewareError,
        _req: &Request,
        _ctx: &RequestContext,
    ) -> Result<ErrorAction, MiddlewareError> {
        Ok(ErrorAction::Propagate)
    }
}

impl dyn Middleware + '_ {
    pub fn is<T: Middleware + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Middleware + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
