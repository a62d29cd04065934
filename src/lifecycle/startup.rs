//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the run log named in config
//! - Register the built-in controller after the application's own
//! - Order controllers and build the dispatcher
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shared by the server and the command runner so both see the same
//!   registration table

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::builtin;
use crate::config::AppConfig;
use crate::controller::{ControllerSet, ControllerSetBuilder};
use crate::dispatch::{DispatchSettings, Dispatcher};
use crate::error::RegistryError;
use crate::scheduler::{RunLog, RunLogError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("handler registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("run log could not be opened: {0}")]
    RunLog(#[from] RunLogError),
}

/// Build the dispatcher for `config` from the application's controllers.
pub fn build_dispatcher(
    config: &AppConfig,
    controllers: ControllerSetBuilder,
) -> Result<Dispatcher, StartupError> {
    let run_log = match &config.scheduler.run_log_path {
        Some(path) => RunLog::load_from_file(PathBuf::from(path))?,
        None => RunLog::default(),
    };

    let controllers: ControllerSet = controllers
        .register(builtin::system_controller(run_log.clone())?)
        .build(&config.dispatch.controller_order)?;

    tracing::info!(
        controllers = controllers.len(),
        handlers = controllers.handlers().count(),
        scheduled = controllers.scheduled().count(),
        "Handler table built"
    );

    Ok(Dispatcher::new(controllers, DispatchSettings::from(config))
        .with_recorder(Arc::new(run_log)))
}
