//! Response conversion.
//!
//! # Responsibilities
//! - Turn the dispatcher's [`Response`] into an HTTP response
//! - Render errors raised before dispatch (maintenance, rate limit)
//!
//! # Design Decisions
//! - CSV downloads carry `Content-Disposition: attachment`
//! - Pre-dispatch errors are plain text; no handler has been chosen yet

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
};

use crate::error::DispatchError;
use crate::render::{error_renderer, RendererKind, Response};

impl IntoResponse for Response {
    fn into_response(self) -> HttpResponse {
        let mut builder = axum::http::Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, self.content_type);

        if let Some(location) = self.location {
            builder = builder.header(header::LOCATION, location);
        }
        if let Some(filename) = self.filename {
            builder = builder.header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename.replace('"', "")),
            );
        }

        builder.body(Body::from(self.body)).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Invalid response headers");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        })
    }
}

/// Plain-text error for requests refused before dispatch.
pub fn error_response(err: &DispatchError) -> HttpResponse {
    let renderer = error_renderer(RendererKind::Text, err, false);
    match Response::from_renderer(&renderer, err.status(), None) {
        Ok(response) => response.into_response(),
        Err(_) => (err.status(), err.public_message(false)).into_response(),
    }
}
