//! Controllers: named groups of handlers owned by one application module.
//!
//! # Data Flow
//! ```text
//! application modules
//!     → Controller::new(..).handler(Handler::new(..)...)
//!     → ControllerSetBuilder::register
//!     → build(controller_order) → ControllerSet (ordered, immutable)
//!     → Dispatcher
//! ```

pub mod handler;
pub mod registry;

pub use handler::{CommandAction, CommandTask, Handler, HttpAction};
pub use registry::{ControllerSet, ControllerSetBuilder};

use crate::render::RendererKind;

/// A named group of handlers.
#[derive(Debug, Clone)]
pub struct Controller {
    name: String,
    module: String,
    output: RendererKind,
    handlers: Vec<Handler>,
}

impl Controller {
    /// New controller with page output.
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            output: RendererKind::Page,
            handlers: Vec::new(),
        }
    }

    /// Renderer family for errors raised by handlers without a route type.
    pub fn output(mut self, kind: RendererKind) -> Self {
        self.output = kind;
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn output_kind(&self) -> RendererKind {
        self.output
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }
}
