//! Handler declarations.
//!
//! A handler is declared once at startup with a builder and never changes
//! afterwards. It may answer HTTP requests, run as a command, or both.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};

use crate::context::{CommandContext, HandlerContext, HttpRequest};
use crate::error::{DispatchError, DispatchResult, RegistryError};
use crate::render::{Renderer, RendererKind};
use crate::routing::{
    Component, ComponentRoute, DispatchPass, Matcher, NotFoundMatcher, PathMatcher,
    RedirectRoute, RouteType,
};
use crate::scheduler::Schedule;
use crate::security::Restriction;

/// Produces the renderer for a handler without a route type.
pub type HttpAction =
    Arc<dyn Fn(&HandlerContext<'_>) -> DispatchResult<Box<dyn Renderer>> + Send + Sync>;

/// Body of a command handler.
pub type CommandAction = Arc<dyn Fn(&mut CommandContext<'_>) -> DispatchResult<()> + Send + Sync>;

/// Command side of a handler.
#[derive(Clone)]
pub struct CommandTask {
    name: String,
    action: CommandAction,
    schedule: Option<Schedule>,
    time_limit: Option<Duration>,
}

impl CommandTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn execute(&self, ctx: &mut CommandContext<'_>) -> DispatchResult<()> {
        (self.action)(ctx)
    }
}

impl fmt::Debug for CommandTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTask")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .field("time_limit", &self.time_limit)
            .finish()
    }
}

/// One declared handler.
#[derive(Clone)]
pub struct Handler {
    name: String,
    matchers: Vec<Arc<dyn Matcher>>,
    restrictions: Vec<Arc<dyn Restriction>>,
    route_type: Option<Arc<dyn RouteType>>,
    action: Option<HttpAction>,
    status: StatusCode,
    full_page_roadblock: bool,
    task: Option<CommandTask>,
}

impl Handler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matchers: Vec::new(),
            restrictions: Vec::new(),
            route_type: None,
            action: None,
            status: StatusCode::OK,
            full_page_roadblock: false,
            task: None,
        }
    }

    /// Match a path template for any method.
    pub fn path(self, template: &str) -> Result<Self, RegistryError> {
        let matcher = PathMatcher::new(template)?;
        Ok(self.matcher(matcher))
    }

    /// Match a path template for one method only.
    pub fn route(self, method: Method, template: &str) -> Result<Self, RegistryError> {
        let matcher = PathMatcher::new(template)?.with_method(method);
        Ok(self.matcher(matcher))
    }

    pub fn matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matchers.push(Arc::new(matcher));
        self
    }

    /// Take part in the not-found pass.
    pub fn not_found(self) -> Self {
        self.matcher(NotFoundMatcher)
    }

    pub fn restrict(mut self, restriction: impl Restriction + 'static) -> Self {
        self.restrictions.push(Arc::new(restriction));
        self
    }

    pub fn route_type(mut self, route_type: impl RouteType + 'static) -> Self {
        self.route_type = Some(Arc::new(route_type));
        self
    }

    pub fn component(self, component: Arc<dyn Component>) -> Self {
        self.route_type(ComponentRoute::new(component))
    }

    pub fn redirect(self, url: impl Into<String>) -> Result<Self, RegistryError> {
        let route = RedirectRoute::new(url)?;
        Ok(self.route_type(route))
    }

    /// Build the renderer in code. Ignored when a route type is set.
    pub fn action<F, R>(mut self, action: F) -> Self
    where
        F: Fn(&HandlerContext<'_>) -> DispatchResult<R> + Send + Sync + 'static,
        R: Renderer + 'static,
    {
        self.action = Some(Arc::new(move |ctx: &HandlerContext<'_>| {
            action(ctx).map(|renderer| Box::new(renderer) as Box<dyn Renderer>)
        }));
        self
    }

    /// Status for successful responses.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Roadblocks replace the whole response with the paywall page.
    pub fn full_page_roadblock(mut self) -> Self {
        self.full_page_roadblock = true;
        self
    }

    /// Run as the named command.
    pub fn command<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut CommandContext<'_>) -> DispatchResult<()> + Send + Sync + 'static,
    {
        self.task = Some(CommandTask {
            name: name.into(),
            action: Arc::new(action),
            schedule: None,
            time_limit: None,
        });
        self
    }

    /// Cron schedule for the command. Declare the command first.
    pub fn schedule(mut self, expr: &str) -> Result<Self, RegistryError> {
        let schedule = Schedule::parse(expr)?;
        match self.task.as_mut() {
            Some(task) => task.schedule = Some(schedule),
            None => {
                return Err(RegistryError::InvalidSchedule {
                    expr: expr.to_string(),
                    reason: format!("handler '{}' declares no command", self.name),
                })
            }
        }
        Ok(self)
    }

    /// Cooperative time limit for the command. Declare the command first.
    pub fn time_limit(mut self, limit: Duration) -> Self {
        if let Some(task) = self.task.as_mut() {
            task.time_limit = Some(limit);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matchers(&self) -> &[Arc<dyn Matcher>] {
        &self.matchers
    }

    pub fn restrictions(&self) -> &[Arc<dyn Restriction>] {
        &self.restrictions
    }

    pub fn success_status(&self) -> StatusCode {
        self.status
    }

    pub fn is_full_page_roadblock(&self) -> bool {
        self.full_page_roadblock
    }

    pub fn task(&self) -> Option<&CommandTask> {
        self.task.as_ref()
    }

    /// First matcher that accepts the request in this pass.
    pub fn first_match(&self, req: &HttpRequest, pass: DispatchPass) -> Option<&dyn Matcher> {
        self.matchers
            .iter()
            .find(|m| m.matches(req, pass))
            .map(|m| m.as_ref())
    }

    /// Renderer family used for error output when no renderer was built.
    pub fn error_kind(&self, req: &HttpRequest, controller_output: RendererKind) -> RendererKind {
        match &self.route_type {
            Some(route_type) => route_type.renderer_kind(req),
            None => controller_output,
        }
    }

    /// Build the renderer: route type first, then the action.
    pub fn build_renderer(&self, ctx: &HandlerContext<'_>) -> DispatchResult<Box<dyn Renderer>> {
        if let Some(route_type) = &self.route_type {
            return route_type.renderer(ctx);
        }
        match &self.action {
            Some(action) => action(ctx),
            None => Err(DispatchError::with_code(
                500,
                format!("handler '{}' has no route type or action", self.name),
            )),
        }
    }

    /// One-line summary for route listings.
    pub fn describe(&self) -> String {
        let matchers: Vec<String> = self.matchers.iter().map(|m| m.describe()).collect();
        let restrictions: Vec<String> = self.restrictions.iter().map(|r| r.describe()).collect();
        let mut line = format!(
            "{} [{}] access=[{}]",
            self.name,
            matchers.join(", "),
            restrictions.join(", ")
        );
        if let Some(route_type) = &self.route_type {
            line.push_str(&format!(" type={}", route_type.describe()));
        }
        if let Some(task) = &self.task {
            line.push_str(&format!(" command={}", task.name));
            if let Some(schedule) = &task.schedule {
                line.push_str(&format!(" schedule=\"{}\"", schedule));
            }
        }
        line
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("matchers", &self.matchers)
            .field("restrictions", &self.restrictions)
            .field("route_type", &self.route_type)
            .field("status", &self.status)
            .field("full_page_roadblock", &self.full_page_roadblock)
            .field("task", &self.task)
            .finish()
    }
}
