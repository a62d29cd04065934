//! HTTP dispatch.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use axum::http::StatusCode;
use tracing::{debug, error, info, trace, warn};

use crate::context::{HandlerContext, HttpRequest};
use crate::controller::{Controller, Handler};
use crate::dispatch::{panic_message, Dispatcher};
use crate::error::{DispatchError, DispatchResult, ErrorKind};
use crate::observability::metrics;
use crate::render::{error_renderer, RendererKind, Response};
use crate::routing::{DispatchPass, Matcher};
use crate::security::{resolve, AccessOutcome, ContentRequirement};

impl Dispatcher {
    /// Produce the response for one request. Never fails.
    pub fn respond(&self, req: &HttpRequest) -> Response {
        let start = Instant::now();

        let response = match self.respond_pass(req, DispatchPass::Primary) {
            Some(response) => response,
            None => {
                debug!(request_id = %req.id(), path = %req.path(), "No handler matched");
                let fallback = if self.settings.load().not_found_fallback {
                    self.respond_pass(req, DispatchPass::NotFound)
                } else {
                    None
                };
                fallback.unwrap_or_else(|| Response::plain(StatusCode::NOT_FOUND, "Not Found"))
            }
        };

        metrics::record_request(response.handler.as_deref(), response.status.as_u16(), start);
        info!(
            request_id = %req.id(),
            method = %req.method(),
            path = %req.path(),
            handler = response.handler.as_deref().unwrap_or("none"),
            status = response.status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request served"
        );
        response
    }

    /// One walk over every handler. `None` when nothing claimed the request.
    fn respond_pass(&self, req: &HttpRequest, pass: DispatchPass) -> Option<Response> {
        for (controller, handler) in self.controllers.handlers() {
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                self.respond_handler(controller, handler, req, pass)
            }));
            match attempt {
                Ok(None) => continue,
                Ok(Some(response)) => return Some(response),
                Err(payload) => {
                    let err = DispatchError::Panicked(panic_message(payload));
                    let kind = panic::catch_unwind(AssertUnwindSafe(|| {
                        handler.error_kind(req, controller.output_kind())
                    }))
                    .unwrap_or_else(|_| controller.output_kind());
                    let reveal = self.reveal_for(req.user());
                    return Some(self.failure(kind, err, handler, req, reveal));
                }
            }
        }
        None
    }

    /// Match, access and produce for one handler. `None` passes the
    /// request on to the next handler.
    fn respond_handler(
        &self,
        controller: &Controller,
        handler: &Handler,
        req: &HttpRequest,
        pass: DispatchPass,
    ) -> Option<Response> {
        let matcher = handler.first_match(req, pass)?;
        debug!(
            request_id = %req.id(),
            controller = controller.name(),
            handler = handler.name(),
            matcher = %matcher.describe(),
            ?pass,
            "Handler matched"
        );

        let reveal = self.reveal_for(req.user());
        let error_kind = handler.error_kind(req, controller.output_kind());

        let roadblock = match resolve(handler.restrictions(), req) {
            AccessOutcome::NotApplicable => {
                trace!(handler = handler.name(), "Handler not applicable, trying next");
                return None;
            }
            AccessOutcome::Denied(denial) => {
                let err = DispatchError::from(denial);
                warn!(
                    request_id = %req.id(),
                    path = %req.path(),
                    handler = handler.name(),
                    user = %req.user().label(),
                    verdict = ?denial,
                    "Access denied"
                );
                metrics::record_access_denied(AccessOutcome::Denied(denial).verdict().label());
                return Some(render_error(error_kind, &err, reveal, handler.name()));
            }
            AccessOutcome::Allowed => None,
            AccessOutcome::Roadblocked(required) => Some(required),
        };

        let response = match self.produce(handler, matcher, req, roadblock, reveal) {
            Ok(response) => response,
            Err(err) => self.failure(error_kind, err, handler, req, reveal),
        };
        Some(response)
    }

    /// Steps after access: arguments, renderer, roadblock override, prepare.
    fn produce(
        &self,
        handler: &Handler,
        matcher: &dyn Matcher,
        req: &HttpRequest,
        roadblock: Option<ContentRequirement>,
        reveal: bool,
    ) -> DispatchResult<Response> {
        let args = matcher.extract(req);
        let full_page = handler.is_full_page_roadblock();
        let ctx = HandlerContext::new(req, handler.name(), args)
            .with_roadblock(roadblock.clone().filter(|_| !full_page));

        let mut renderer = handler.build_renderer(&ctx)?;
        let mut status = handler.success_status();

        if let Some(required) = roadblock.filter(|_| full_page) {
            debug!(
                request_id = %req.id(),
                handler = handler.name(),
                level = required.level,
                content = %required.content,
                "Full-page roadblock"
            );
            metrics::record_access_denied("roadblocked");
            let err = DispatchError::Roadblocked { level: required.level };
            renderer = Box::new(error_renderer(renderer.kind(), &err, reveal));
            status = err.status();
        }

        renderer.prepare(&ctx)?;
        Response::from_renderer(renderer.as_ref(), status, Some(handler.name()))
    }

    fn failure(
        &self,
        kind: RendererKind,
        err: DispatchError,
        handler: &Handler,
        req: &HttpRequest,
        reveal: bool,
    ) -> Response {
        match err.kind() {
            ErrorKind::Resource => {
                debug!(
                    request_id = %req.id(),
                    handler = handler.name(),
                    error = %err,
                    "Resource not found"
                );
            }
            ErrorKind::Generic => {
                error!(
                    request_id = %req.id(),
                    method = %req.method(),
                    path = %req.path(),
                    handler = handler.name(),
                    user_id = ?req.user().id,
                    username = ?req.user().username,
                    error = %err,
                    "Handler failed"
                );
            }
            _ => {
                warn!(
                    request_id = %req.id(),
                    handler = handler.name(),
                    error = %err,
                    "Handler refused"
                );
            }
        }
        render_error(kind, &err, reveal, handler.name())
    }
}

/// Render a pre-built error page, falling back to plain text if that fails.
fn render_error(kind: RendererKind, err: &DispatchError, reveal: bool, handler: &str) -> Response {
    let renderer = error_renderer(kind, err, reveal);
    Response::from_renderer(&renderer, err.status(), Some(handler)).unwrap_or_else(|render_err| {
        error!(error = %render_err, "Error page failed to render");
        let mut response = Response::plain(err.status(), err.public_message(reveal));
        response.handler = Some(handler.to_string());
        response
    })
}
