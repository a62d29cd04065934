//! Route types: how a matched handler turns into a renderer.
//!
//! # Renderer Kind Inference
//! ```text
//! explicit kind on the component?      → that kind
//! HTML-capable?
//!     reloadable and request is reload → Fragment
//!     otherwise                        → Page
//! JSON → XML → CSV                     → first capability present
//! nothing                              → Text
//! ```
//! `renderer` and `renderer_kind` share [`infer_kind`] so the error path,
//! which only needs the kind, never disagrees with the normal path.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::context::{HandlerContext, HttpRequest};
use crate::error::{DispatchError, DispatchResult, RegistryError};
use crate::render::payload::encode;
use crate::render::{Payload, RedirectRenderer, Rendered, Renderer, RendererKind};

bitflags! {
    /// Output families a component can produce.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const HTML = 1;
        const RELOADABLE = 1 << 1;
        const JSON = 1 << 2;
        const XML = 1 << 3;
        const CSV = 1 << 4;
    }
}

/// Pick the renderer family for a component.
pub fn infer_kind(
    explicit: Option<RendererKind>,
    capabilities: Capabilities,
    reload: bool,
) -> RendererKind {
    if let Some(kind) = explicit {
        return kind;
    }
    if capabilities.contains(Capabilities::HTML) {
        if reload && capabilities.contains(Capabilities::RELOADABLE) {
            return RendererKind::Fragment;
        }
        return RendererKind::Page;
    }
    if capabilities.contains(Capabilities::JSON) {
        RendererKind::Json
    } else if capabilities.contains(Capabilities::XML) {
        RendererKind::Xml
    } else if capabilities.contains(Capabilities::CSV) {
        RendererKind::Csv
    } else {
        RendererKind::Text
    }
}

/// A unit of page or API output owned by an application module.
pub trait Component: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Explicit renderer family; beats inference.
    fn kind_override(&self) -> Option<RendererKind> {
        None
    }

    /// Produce the data to render. Runs during `prepare()`.
    fn build(&self, ctx: &HandlerContext<'_>) -> DispatchResult<Payload>;
}

/// Strategy that builds a renderer for a matched handler.
pub trait RouteType: Send + Sync + fmt::Debug {
    fn renderer(&self, ctx: &HandlerContext<'_>) -> DispatchResult<Box<dyn Renderer>>;

    /// The family `renderer` would produce, without building anything.
    fn renderer_kind(&self, req: &HttpRequest) -> RendererKind;

    fn describe(&self) -> String;
}

/// Builds a renderer from a component.
#[derive(Debug, Clone)]
pub struct ComponentRoute {
    component: Arc<dyn Component>,
}

impl ComponentRoute {
    pub fn new(component: Arc<dyn Component>) -> Self {
        Self { component }
    }
}

impl RouteType for ComponentRoute {
    fn renderer(&self, ctx: &HandlerContext<'_>) -> DispatchResult<Box<dyn Renderer>> {
        Ok(Box::new(ComponentRenderer {
            component: Arc::clone(&self.component),
            kind: self.renderer_kind(ctx.request()),
            payload: None,
        }))
    }

    fn renderer_kind(&self, req: &HttpRequest) -> RendererKind {
        infer_kind(
            self.component.kind_override(),
            self.component.capabilities(),
            req.is_reload(),
        )
    }

    fn describe(&self) -> String {
        format!("component({})", self.component.name())
    }
}

/// Renderer whose data comes from a component during `prepare()`.
#[derive(Debug)]
pub struct ComponentRenderer {
    component: Arc<dyn Component>,
    kind: RendererKind,
    payload: Option<Payload>,
}

impl Renderer for ComponentRenderer {
    fn kind(&self) -> RendererKind {
        self.kind
    }

    fn prepare(&mut self, ctx: &HandlerContext<'_>) -> DispatchResult<()> {
        self.payload = Some(self.component.build(ctx)?);
        Ok(())
    }

    fn render(&self) -> DispatchResult<Rendered> {
        let payload = self.payload.as_ref().ok_or_else(|| {
            DispatchError::Render(format!(
                "component '{}' rendered before prepare",
                self.component.name()
            ))
        })?;
        Ok(Rendered {
            content_type: self.kind.content_type().to_string(),
            body: encode(self.kind, payload)?,
            location: None,
            filename: (self.kind == RendererKind::Csv)
                .then(|| format!("{}.csv", self.component.name())),
        })
    }
}

/// Always redirects to a fixed URL.
#[derive(Debug, Clone)]
pub struct RedirectRoute {
    url: String,
}

impl RedirectRoute {
    /// Accepts site-relative paths (`/login`) and absolute URLs.
    pub fn new(url: impl Into<String>) -> Result<Self, RegistryError> {
        let url = url.into();
        if url.starts_with('/') || url::Url::parse(&url).is_ok() {
            Ok(Self { url })
        } else {
            Err(RegistryError::InvalidRedirect(url))
        }
    }
}

impl RouteType for RedirectRoute {
    fn renderer(&self, _ctx: &HandlerContext<'_>) -> DispatchResult<Box<dyn Renderer>> {
        Ok(Box::new(RedirectRenderer::to(self.url.clone())))
    }

    fn renderer_kind(&self, _req: &HttpRequest) -> RendererKind {
        RendererKind::Redirect
    }

    fn describe(&self) -> String {
        format!("redirect({})", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RouteArgs;
    use serde_json::json;

    #[derive(Debug)]
    struct Widget {
        caps: Capabilities,
        explicit: Option<RendererKind>,
    }

    impl Component for Widget {
        fn name(&self) -> &str {
            "widget"
        }

        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        fn kind_override(&self) -> Option<RendererKind> {
            self.explicit
        }

        fn build(&self, ctx: &HandlerContext<'_>) -> DispatchResult<Payload> {
            if ctx.arg("id") == Some("missing") {
                return Err(DispatchError::not_found("widget"));
            }
            Ok(Payload::Data(json!([{"id": 1}])))
        }
    }

    fn route(caps: Capabilities) -> ComponentRoute {
        ComponentRoute::new(Arc::new(Widget { caps, explicit: None }))
    }

    #[test]
    fn test_inference_cascade() {
        assert_eq!(infer_kind(None, Capabilities::HTML, false), RendererKind::Page);
        assert_eq!(infer_kind(None, Capabilities::HTML, true), RendererKind::Page);
        assert_eq!(
            infer_kind(None, Capabilities::HTML | Capabilities::RELOADABLE, true),
            RendererKind::Fragment
        );
        assert_eq!(
            infer_kind(None, Capabilities::HTML | Capabilities::RELOADABLE, false),
            RendererKind::Page
        );
        assert_eq!(
            infer_kind(None, Capabilities::JSON | Capabilities::XML, false),
            RendererKind::Json
        );
        assert_eq!(
            infer_kind(None, Capabilities::XML | Capabilities::CSV, false),
            RendererKind::Xml
        );
        assert_eq!(infer_kind(None, Capabilities::CSV, false), RendererKind::Csv);
        assert_eq!(infer_kind(None, Capabilities::empty(), false), RendererKind::Text);
        assert_eq!(
            infer_kind(Some(RendererKind::Xml), Capabilities::HTML, false),
            RendererKind::Xml
        );
    }

    #[test]
    fn test_renderer_and_kind_agree() {
        let all = [
            Capabilities::HTML,
            Capabilities::HTML | Capabilities::RELOADABLE,
            Capabilities::JSON,
            Capabilities::XML,
            Capabilities::CSV,
            Capabilities::empty(),
        ];
        for caps in all {
            for reload in [false, true] {
                let req = HttpRequest::get("w").with_reload(reload);
                let ctx = HandlerContext::new(&req, "w", RouteArgs::Request);
                let route = route(caps);
                let renderer = route.renderer(&ctx).unwrap();
                assert_eq!(renderer.kind(), route.renderer_kind(&req), "{:?} {}", caps, reload);
            }
        }
    }

    #[test]
    fn test_component_renderer_prepares_then_renders() {
        let req = HttpRequest::get("w");
        let ctx = HandlerContext::new(&req, "w", RouteArgs::Request);
        let mut renderer = route(Capabilities::CSV).renderer(&ctx).unwrap();

        assert!(renderer.render().is_err());
        renderer.prepare(&ctx).unwrap();
        let rendered = renderer.render().unwrap();
        assert_eq!(rendered.body, "id\n1\n");
        assert_eq!(rendered.filename.as_deref(), Some("widget.csv"));
    }

    #[test]
    fn test_component_not_found_surfaces_in_prepare() {
        let req = HttpRequest::get("w/missing");
        let args = RouteArgs::Named(vec![("id".into(), "missing".into())]);
        let ctx = HandlerContext::new(&req, "w", args);
        let mut renderer = route(Capabilities::JSON).renderer(&ctx).unwrap();
        assert!(matches!(renderer.prepare(&ctx), Err(DispatchError::NotFound(_))));
    }

    #[test]
    fn test_redirect_route() {
        assert!(RedirectRoute::new("/login").is_ok());
        assert!(RedirectRoute::new("https://example.com/x").is_ok());
        assert!(matches!(
            RedirectRoute::new("login"),
            Err(RegistryError::InvalidRedirect(_))
        ));

        let route = RedirectRoute::new("/login").unwrap();
        let req = HttpRequest::get("old-login");
        let ctx = HandlerContext::new(&req, "r", RouteArgs::Request);
        let renderer = route.renderer(&ctx).unwrap();
        assert_eq!(renderer.kind(), route.renderer_kind(&req));
        assert_eq!(renderer.render().unwrap().location.as_deref(), Some("/login"));
    }
}
