//! Values handed to a matched handler.

use crate::context::{HttpRequest, User};
use crate::routing::RouteArgs;
use crate::security::ContentRequirement;

/// Everything a handler or renderer may read during one dispatch.
#[derive(Debug, Clone)]
pub struct HandlerContext<'a> {
    request: &'a HttpRequest,
    handler: &'a str,
    args: RouteArgs,
    roadblock: Option<ContentRequirement>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(request: &'a HttpRequest, handler: &'a str, args: RouteArgs) -> Self {
        Self {
            request,
            handler,
            args,
            roadblock: None,
        }
    }

    /// Attach a non-fatal roadblock found during access resolution.
    pub fn with_roadblock(mut self, roadblock: Option<ContentRequirement>) -> Self {
        self.roadblock = roadblock;
        self
    }

    pub fn request(&self) -> &'a HttpRequest {
        self.request
    }

    pub fn user(&self) -> &'a User {
        self.request.user()
    }

    /// Name of the handler being run.
    pub fn handler(&self) -> &'a str {
        self.handler
    }

    pub fn args(&self) -> &RouteArgs {
        &self.args
    }

    /// Named path argument.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name)
    }

    /// Gated content the caller is not entitled to, if any.
    ///
    /// Set only on handlers that are not full-page roadblocks; such handlers
    /// render a teaser instead of refusing the page.
    pub fn roadblock(&self) -> Option<&ContentRequirement> {
        self.roadblock.as_ref()
    }
}
