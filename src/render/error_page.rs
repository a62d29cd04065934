//! Pre-built error renderers.
//!
//! One renderer per error, shaped like the output the caller expected:
//! an HTML page for pages, a JSON object for JSON endpoints, and so on.

use html_escape::encode_text;
use serde_json::json;

use crate::error::DispatchError;
use crate::render::kind::RendererKind;
use crate::render::payload::Payload;
use crate::render::renderer::ContentRenderer;

fn title(err: &DispatchError) -> &'static str {
    match err {
        DispatchError::Forbidden | DispatchError::Uncontrolled => "Access denied",
        DispatchError::LoginRequired => "Login required",
        DispatchError::Roadblocked { .. } => "Subscription required",
        DispatchError::NotFound(_) => "Page not found",
        DispatchError::RateLimited => "Too many requests",
        DispatchError::Maintenance => "Down for maintenance",
        _ => "Error",
    }
}

/// Build the error renderer for `err` in the family `kind`.
///
/// `reveal` controls whether generic error detail is shown.
pub fn error_renderer(kind: RendererKind, err: &DispatchError, reveal: bool) -> ContentRenderer {
    let status = err.status();
    let message = err.public_message(reveal);
    let heading = title(err);

    let (kind, payload) = match kind {
        RendererKind::Page | RendererKind::Fragment => {
            let mut body = format!(
                "<h1>{}</h1>\n<p>{}</p>",
                encode_text(heading),
                encode_text(&message)
            );
            if let DispatchError::Roadblocked { level } = err {
                body.push_str(&format!(
                    "\n<div class=\"paywall\" data-level=\"{}\">\
                     Subscribe to continue reading.</div>",
                    level
                ));
            }
            let payload = if kind == RendererKind::Page {
                Payload::titled(heading, body)
            } else {
                Payload::html(body)
            };
            (kind, payload)
        }
        RendererKind::Json | RendererKind::Xml => (
            kind,
            Payload::Data(json!({
                "error": {
                    "status": status.as_u16(),
                    "title": heading,
                    "message": message,
                }
            })),
        ),
        // A redirect has no body of its own; fall back to plain text.
        RendererKind::Csv | RendererKind::Text | RendererKind::Redirect => (
            RendererKind::Text,
            Payload::Text(format!("{} {}: {}", status.as_u16(), heading, message)),
        ),
    };

    ContentRenderer::new(kind, payload).with_status(status)
}
