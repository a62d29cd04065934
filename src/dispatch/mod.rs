//! The dispatcher: one entry point for HTTP requests, one for commands.
//!
//! # Data Flow
//! ```text
//! HttpRequest
//!     → respond.rs: walk ControllerSet in priority order
//!         → first matching Matcher per handler
//!         → security::access::resolve
//!         → RouteType / action → Renderer → prepare → Response
//!     → not-found pass once, then bare 404
//!
//! Command
//!     → run.rs: exact command name lookup
//!         → Deadline + run record (scheduled only)
//!         → CommandTask::execute
//! ```
//!
//! # Design Decisions
//! - Synchronous core; the host runs it on a blocking thread
//! - No per-request state outlives a call; the dispatcher is shared freely
//! - Settings are swapped atomically so reloads never block requests

mod respond;
mod run;

pub use run::CommandReport;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::config::{AppConfig, Environment};
use crate::context::User;
use crate::controller::ControllerSet;
use crate::scheduler::{RunLog, RunRecorder};

/// Runtime knobs that may change on config reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub environment: Environment,
    /// Run the not-found pass when nothing matches.
    pub not_found_fallback: bool,
    /// Time limit for commands that declare none.
    pub default_time_limit: Option<Duration>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            not_found_fallback: true,
            default_time_limit: None,
        }
    }
}

impl From<&AppConfig> for DispatchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            environment: config.environment.name,
            not_found_fallback: config.dispatch.not_found_fallback,
            default_time_limit: config
                .scheduler
                .default_time_limit_secs
                .map(Duration::from_secs),
        }
    }
}

/// Finds and runs the handler responsible for a request or command.
pub struct Dispatcher {
    controllers: ControllerSet,
    settings: ArcSwap<DispatchSettings>,
    recorder: Arc<dyn RunRecorder>,
}

impl Dispatcher {
    /// Dispatcher with an in-memory run log.
    pub fn new(controllers: ControllerSet, settings: DispatchSettings) -> Self {
        Self {
            controllers,
            settings: ArcSwap::from_pointee(settings),
            recorder: Arc::new(RunLog::default()),
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn RunRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn controllers(&self) -> &ControllerSet {
        &self.controllers
    }

    pub fn settings(&self) -> Arc<DispatchSettings> {
        self.settings.load_full()
    }

    pub fn update_settings(&self, settings: DispatchSettings) {
        tracing::info!(environment = ?settings.environment, "Dispatch settings updated");
        self.settings.store(Arc::new(settings));
    }

    /// Whether generic error detail may be shown to this caller.
    fn reveal_for(&self, user: &User) -> bool {
        user.is_admin() || !self.settings.load().environment.is_production()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("controllers", &self.controllers.len())
            .field("settings", &self.settings.load())
            .finish()
    }
}

/// Best-effort text of a caught panic.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
