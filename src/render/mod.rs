//! Output rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Handler / RouteType
//!     → renderer.rs (Renderer: prepare() loads data, render() serializes)
//!     → payload.rs (encode Payload for a RendererKind)
//!     → response.rs (status + body + headers, host-agnostic)
//!
//! Error branches:
//!     DispatchError + RendererKind → error_page.rs → Renderer
//! ```
//!
//! # Design Decisions
//! - Renderers are per-request and never reused
//! - The renderer kind is a closed enum so error pages can be built
//!   before any renderer instance exists

pub mod error_page;
pub mod kind;
pub mod payload;
pub mod renderer;
pub mod response;

pub use error_page::error_renderer;
pub use kind::RendererKind;
pub use payload::Payload;
pub use renderer::{ContentRenderer, RedirectRenderer, Rendered, Renderer};
pub use response::Response;
