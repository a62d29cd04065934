//! The renderer contract and the stock renderers.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::context::HandlerContext;
use crate::error::{DispatchError, DispatchResult};
use crate::render::kind::RendererKind;
use crate::render::payload::{encode, Payload};

/// Serialized output of a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub content_type: String,
    pub body: String,
    /// Target of a redirect.
    pub location: Option<String>,
    /// Download name for attachments.
    pub filename: Option<String>,
}

/// Per-request output object.
///
/// `prepare` may load data and mutate the renderer; `render` only reads.
pub trait Renderer: Send {
    fn kind(&self) -> RendererKind;

    fn prepare(&mut self, _ctx: &HandlerContext<'_>) -> DispatchResult<()> {
        Ok(())
    }

    fn render(&self) -> DispatchResult<Rendered>;

    /// Status this renderer insists on, overriding the handler's.
    fn status(&self) -> Option<StatusCode> {
        None
    }
}

/// Renders an already-built payload.
#[derive(Debug, Clone)]
pub struct ContentRenderer {
    kind: RendererKind,
    payload: Payload,
    status: Option<StatusCode>,
    filename: Option<String>,
}

impl ContentRenderer {
    pub fn new(kind: RendererKind, payload: Payload) -> Self {
        Self {
            kind,
            payload,
            status: None,
            filename: None,
        }
    }

    pub fn page(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(RendererKind::Page, Payload::titled(title, body))
    }

    pub fn fragment(body: impl Into<String>) -> Self {
        Self::new(RendererKind::Fragment, Payload::html(body))
    }

    pub fn json(value: Value) -> Self {
        Self::new(RendererKind::Json, Payload::Data(value))
    }

    /// JSON from any serializable value.
    pub fn json_of<T: Serialize>(value: &T) -> DispatchResult<Self> {
        let value = serde_json::to_value(value).map_err(|e| DispatchError::Render(e.to_string()))?;
        Ok(Self::json(value))
    }

    pub fn xml(value: Value) -> Self {
        Self::new(RendererKind::Xml, Payload::Data(value))
    }

    pub fn csv(value: Value, filename: impl Into<String>) -> Self {
        let mut renderer = Self::new(RendererKind::Csv, Payload::Data(value));
        renderer.filename = Some(filename.into());
        renderer
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(RendererKind::Text, Payload::Text(text.into()))
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl Renderer for ContentRenderer {
    fn kind(&self) -> RendererKind {
        self.kind
    }

    fn render(&self) -> DispatchResult<Rendered> {
        Ok(Rendered {
            content_type: self.kind.content_type().to_string(),
            body: encode(self.kind, &self.payload)?,
            location: None,
            filename: self.filename.clone(),
        })
    }

    fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

/// Sends the caller elsewhere.
#[derive(Debug, Clone)]
pub struct RedirectRenderer {
    url: String,
    permanent: bool,
}

impl RedirectRenderer {
    pub fn to(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            permanent: false,
        }
    }

    pub fn permanent(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            permanent: true,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Renderer for RedirectRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Redirect
    }

    fn render(&self) -> DispatchResult<Rendered> {
        Ok(Rendered {
            content_type: RendererKind::Redirect.content_type().to_string(),
            body: format!("Redirecting to {}", self.url),
            location: Some(self.url.clone()),
            filename: None,
        })
    }

    fn status(&self) -> Option<StatusCode> {
        Some(if self.permanent {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::FOUND
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_renderer_json() {
        let rendered = ContentRenderer::json(json!({"ok": true})).render().unwrap();
        assert_eq!(rendered.content_type, "application/json");
        assert_eq!(rendered.body, r#"{"ok":true}"#);
    }

    #[test]
    fn test_csv_carries_filename() {
        let renderer = ContentRenderer::csv(json!([{"a": 1}]), "report.csv");
        let rendered = renderer.render().unwrap();
        assert_eq!(rendered.filename.as_deref(), Some("report.csv"));
        assert_eq!(renderer.kind(), RendererKind::Csv);
    }

    #[test]
    fn test_redirect() {
        let renderer = RedirectRenderer::to("/login");
        let rendered = renderer.render().unwrap();
        assert_eq!(rendered.location.as_deref(), Some("/login"));
        assert_eq!(renderer.status(), Some(StatusCode::FOUND));
        assert_eq!(
            RedirectRenderer::permanent("/new").status(),
            Some(StatusCode::MOVED_PERMANENTLY)
        );
    }

    #[test]
    fn test_status_override() {
        let renderer = ContentRenderer::text("gone").with_status(StatusCode::GONE);
        assert_eq!(renderer.status(), Some(StatusCode::GONE));
    }
}
