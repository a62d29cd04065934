//! Command dispatch for the CLI and the scheduler.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::context::{Command, CommandContext};
use crate::dispatch::{panic_message, Dispatcher};
use crate::error::{DispatchError, DispatchResult};
use crate::observability::metrics;
use crate::scheduler::{Deadline, FinishedRun, RunOutcome};

/// What a successful command run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub command: String,
    pub output: String,
    pub elapsed: Duration,
    /// The body returned after its time limit had passed.
    pub timed_out: bool,
    /// Run record id, for scheduled runs that could be recorded.
    pub run_id: Option<Uuid>,
}

impl Dispatcher {
    /// Run the handler whose command name equals `command.name`.
    ///
    /// Failures are returned with their detail intact; command callers are
    /// operators, not site visitors.
    pub fn run(&self, command: &Command) -> DispatchResult<CommandReport> {
        let handler = self
            .controllers
            .find_command(&command.name)
            .ok_or_else(|| DispatchError::not_found(format!("command '{}'", command.name)))?;
        let task = handler
            .task()
            .ok_or_else(|| DispatchError::not_found(format!("command '{}'", command.name)))?;

        let limit = task.time_limit().or(self.settings.load().default_time_limit);
        let deadline = Deadline::from_limit(limit);

        let run_id = if command.scheduled {
            match self.recorder.start(command, Utc::now()) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(
                        command = %command.name,
                        error = %e,
                        "Could not open run record, running anyway"
                    );
                    None
                }
            }
        } else {
            None
        };

        info!(
            command = %command.name,
            args = ?command.args,
            scheduled = command.scheduled,
            time_limit_secs = limit.map(|l| l.as_secs()),
            "Running command"
        );

        let mut ctx = CommandContext::new(command, deadline, &self.controllers);
        let result = panic::catch_unwind(AssertUnwindSafe(|| task.execute(&mut ctx)))
            .unwrap_or_else(|payload| Err(DispatchError::Panicked(panic_message(payload))));

        let elapsed = deadline.elapsed();
        let timed_out = deadline.expired();
        let output = ctx.into_output();

        if let Some(id) = run_id {
            let outcome = match &result {
                Ok(()) => RunOutcome::Completed {
                    output: output.clone(),
                },
                Err(err) => RunOutcome::Failed {
                    message: err.to_string(),
                },
            };
            let finished = FinishedRun {
                finished_at: Utc::now(),
                duration: elapsed,
                outcome,
                timed_out,
            };
            if let Err(e) = self.recorder.finish(id, finished) {
                warn!(
                    command = %command.name,
                    run_id = %id,
                    error = %e,
                    "Could not close run record"
                );
            }
        }

        match result {
            Ok(()) => {
                metrics::record_command(&command.name, "completed", elapsed);
                info!(
                    command = %command.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    timed_out,
                    "Command completed"
                );
                Ok(CommandReport {
                    command: command.name.clone(),
                    output,
                    elapsed,
                    timed_out,
                    run_id,
                })
            }
            Err(err) => {
                metrics::record_command(&command.name, "failed", elapsed);
                error!(
                    command = %command.name,
                    args = ?command.args,
                    scheduled = command.scheduled,
                    error = %err,
                    "Command failed"
                );
                Err(DispatchError::command(&command.name, &err, true))
            }
        }
    }

    /// Names of scheduled commands due in the minute containing `now`.
    pub fn due_commands(&self, now: DateTime<Utc>) -> Vec<&str> {
        self.controllers
            .scheduled()
            .filter_map(|h| h.task())
            .filter(|t| t.schedule().is_some_and(|s| s.is_due(now)))
            .map(|t| t.name())
            .collect()
    }

    /// Run every due command as a scheduled invocation. One failure does
    /// not stop the sweep.
    pub fn run_due(&self, now: DateTime<Utc>) -> Vec<(String, DispatchResult<CommandReport>)> {
        let due = self.due_commands(now);
        info!(count = due.len(), at = %now, "Running due commands");
        due.into_iter()
            .map(|name| {
                let command = Command::new(name).scheduled();
                let result = self.run(&command);
                (name.to_string(), result)
            })
            .collect()
    }
}
