//! Configuration file watcher for hot reload.
//!
//! Only the environment, rate limits and error gating change on reload.
//! The listener address and controller order are fixed at startup; a file
//! that changes them is still applied, with a warning naming the fields
//! that will wait for a restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;

/// Settings read once when the process starts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StartupFields {
    bind_address: String,
    controller_order: Vec<String>,
}

impl StartupFields {
    fn of(config: &AppConfig) -> Self {
        Self {
            bind_address: config.listener.bind_address.clone(),
            controller_order: config.dispatch.controller_order.clone(),
        }
    }

    /// Names of startup-only fields that differ in `next`.
    fn changed_in(&self, next: &AppConfig) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.bind_address != next.listener.bind_address {
            changed.push("listener.bind_address");
        }
        if self.controller_order != next.dispatch.controller_order {
            changed.push("dispatch.controller_order");
        }
        changed
    }
}

/// Monitors the configuration file and emits each valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    startup: StartupFields,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    /// `running` is the configuration the process started with.
    pub fn new(path: &Path, running: &AppConfig) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            startup: StartupFields::of(running),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Keep the returned watcher alive for as long as
    /// updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            startup,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!(path = ?path, "Config file change detected, reloading");
                    reload(&path, &startup, &update_tx);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}

/// Load, check and forward one new version. False when nothing was sent.
fn reload(path: &Path, startup: &StartupFields, tx: &mpsc::UnboundedSender<AppConfig>) -> bool {
    let next = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            return false;
        }
    };

    let pending = startup.changed_in(&next);
    if !pending.is_empty() {
        tracing::warn!(fields = ?pending, "Changed settings take effect after a restart");
    }
    tx.send(next).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_startup_only_changes_are_reported() {
        let running = AppConfig::default();
        let startup = StartupFields::of(&running);
        assert!(startup.changed_in(&running).is_empty());

        let mut next = running.clone();
        next.environment.maintenance = true;
        assert!(startup.changed_in(&next).is_empty());

        next.dispatch.controller_order = vec!["cms".into()];
        next.listener.bind_address = "127.0.0.1:9000".into();
        assert_eq!(
            startup.changed_in(&next),
            vec!["listener.bind_address", "dispatch.controller_order"]
        );
    }

    #[test]
    fn test_reload_forwards_valid_files_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[environment]\nmaintenance = true").unwrap();

        let running = AppConfig::default();
        let (watcher, mut updates) = ConfigWatcher::new(file.path(), &running);
        assert!(reload(file.path(), &watcher.startup, &watcher.update_tx));
        assert!(updates.try_recv().unwrap().environment.maintenance);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        writeln!(broken, "[rate_limit]\nenabled = true\nburst_size = 0").unwrap();
        assert!(!reload(broken.path(), &watcher.startup, &watcher.update_tx));
        assert!(updates.try_recv().is_err());
    }
}
