//! Maintenance mode gate.
//!
//! While `environment.maintenance` is set in the live config, every request
//! from a non-administrator is answered with 503 before dispatch.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::error::DispatchError;
use crate::http::response::error_response;
use crate::http::AppState;

pub async fn maintenance_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.load().environment.maintenance {
        return next.run(request).await;
    }

    let user = state.authenticator.authenticate(request.headers());
    if user.is_admin() {
        tracing::debug!(user = %user.label(), "Administrator bypassing maintenance mode");
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "Refused during maintenance");
    error_response(&DispatchError::Maintenance)
}
