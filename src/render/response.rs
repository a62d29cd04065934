//! Host-agnostic response.

use axum::http::StatusCode;

use crate::error::DispatchResult;
use crate::render::renderer::Renderer;

/// Final output of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: String,
    pub body: String,
    pub location: Option<String>,
    pub filename: Option<String>,
    /// Handler that produced the response, if any.
    pub handler: Option<String>,
}

impl Response {
    /// Render `renderer`. A status the renderer insists on beats `status`.
    pub fn from_renderer(
        renderer: &dyn Renderer,
        status: StatusCode,
        handler: Option<&str>,
    ) -> DispatchResult<Self> {
        let rendered = renderer.render()?;
        Ok(Self {
            status: renderer.status().unwrap_or(status),
            content_type: rendered.content_type,
            body: rendered.body,
            location: rendered.location,
            filename: rendered.filename,
            handler: handler.map(str::to_string),
        })
    }

    /// Plain-text response with no handler behind it.
    pub fn plain(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: body.into(),
            location: None,
            filename: None,
            handler: None,
        }
    }
}
