//! The handler registration table.
//!
//! # Responsibilities
//! - Collect controllers from application modules at startup
//! - Order them by configured module priority
//! - Reject duplicate command names
//!
//! # Design Decisions
//! - Built once, read-only afterwards; shared across requests without locks
//! - Unlisted modules keep registration order after the listed ones

use std::collections::HashMap;

use crate::controller::{Controller, Handler};
use crate::error::RegistryError;

/// Controllers waiting to be ordered.
#[derive(Debug, Default)]
pub struct ControllerSetBuilder {
    controllers: Vec<Controller>,
}

impl ControllerSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, controller: Controller) -> Self {
        self.controllers.push(controller);
        self
    }

    /// Order by `priority` (module names, earliest first) and validate.
    pub fn build(self, priority: &[String]) -> Result<ControllerSet, RegistryError> {
        let rank: HashMap<&str, usize> = priority
            .iter()
            .enumerate()
            .map(|(i, module)| (module.as_str(), i))
            .collect();

        let mut controllers = self.controllers;
        // Stable sort keeps registration order among equals.
        controllers.sort_by_key(|c| rank.get(c.module()).copied().unwrap_or(usize::MAX));

        let mut commands: HashMap<&str, &str> = HashMap::new();
        for controller in &controllers {
            for handler in controller.handlers() {
                if let Some(task) = handler.task() {
                    if commands.insert(task.name(), handler.name()).is_some() {
                        return Err(RegistryError::DuplicateCommand(task.name().to_string()));
                    }
                }
            }
        }

        Ok(ControllerSet { controllers })
    }
}

/// Ordered, immutable set of controllers.
#[derive(Debug, Default)]
pub struct ControllerSet {
    controllers: Vec<Controller>,
}

impl ControllerSet {
    pub fn builder() -> ControllerSetBuilder {
        ControllerSetBuilder::new()
    }

    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    /// Every handler in dispatch order, with its controller.
    pub fn handlers(&self) -> impl Iterator<Item = (&Controller, &Handler)> {
        self.controllers
            .iter()
            .flat_map(|c| c.handlers().iter().map(move |h| (c, h)))
    }

    /// Handler whose command name equals `name` exactly.
    pub fn find_command(&self, name: &str) -> Option<&Handler> {
        self.handlers()
            .map(|(_, h)| h)
            .find(|h| h.task().is_some_and(|t| t.name() == name))
    }

    /// Handlers whose command carries a schedule.
    pub fn scheduled(&self) -> impl Iterator<Item = &Handler> {
        self.handlers()
            .map(|(_, h)| h)
            .filter(|h| h.task().is_some_and(|t| t.schedule().is_some()))
    }

    /// Human-readable listing, one line per handler.
    pub fn describe(&self) -> Vec<String> {
        self.handlers()
            .map(|(c, h)| format!("{}::{}", c.module(), h.describe()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
