//! Request handling and conversion.
//!
//! # Responsibilities
//! - Attach a request ID (preserved if the client sent one)
//! - Convert an HTTP request into the dispatcher's [`HttpRequest`]
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Unparseable query strings, forms and cookies degrade to empty values;
//!   the handler decides whether that is an error

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::http::{header, request::Parts, HeaderValue, Request};
use cookie::Cookie;
use tower::{Layer, Service};
use uuid::Uuid;

use crate::context::{HttpRequest, Params};
use crate::http::auth::Authenticator;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_RELOAD: &str = "x-reload";

/// Request ID stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Access to the request ID on any request type.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions().get::<RequestId>().map(|id| id.0.as_str())
    }
}

impl RequestIdExt for Parts {
    fn request_id(&self) -> Option<&str> {
        self.extensions.get::<RequestId>().map(|id| id.0.as_str())
    }
}

/// Layer that tags every request and response with `X-Request-ID`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B, ResBody> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>, Response = axum::http::Response<ResBody>>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let value = match request.headers().get(X_REQUEST_ID) {
            Some(existing) if existing.to_str().is_ok_and(|v| !v.is_empty()) => existing.clone(),
            _ => {
                let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                    .unwrap_or_else(|_| HeaderValue::from_static("invalid"));
                request.headers_mut().insert(X_REQUEST_ID, generated.clone());
                generated
            }
        };
        let id = value.to_str().unwrap_or_default().to_string();
        request.extensions_mut().insert(RequestId(id));

        let future = self.inner.call(request);
        Box::pin(async move {
            let mut response = future.await?;
            response.headers_mut().insert(X_REQUEST_ID, value);
            Ok(response)
        })
    }
}

fn parse_pairs(raw: &[u8]) -> Params {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw)
        .map(Params::from_iter)
        .unwrap_or_default()
}

fn parse_cookies(parts: &Parts) -> Params {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw).flatten())
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}

fn is_form(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Build the dispatcher's view of a request.
pub fn to_http_request(
    parts: &Parts,
    body: &[u8],
    authenticator: &dyn Authenticator,
) -> HttpRequest {
    let query = parse_pairs(parts.uri.query().unwrap_or_default().as_bytes());
    let body = if is_form(parts) {
        parse_pairs(body)
    } else {
        Params::new()
    };

    let reload = parts
        .headers
        .get(X_RELOAD)
        .is_some_and(|v| v.as_bytes() == b"1")
        || query.get("reload") == Some("1");

    let id = parts
        .request_id()
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    HttpRequest::new(parts.method.clone(), parts.uri.path())
        .with_id(id)
        .with_user(authenticator.authenticate(&parts.headers))
        .with_cookies(parse_cookies(parts))
        .with_session(authenticator.session(&parts.headers))
        .with_reload(reload)
        .with_query(query)
        .with_body(body)
}
