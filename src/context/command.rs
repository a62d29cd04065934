//! Command-line invocation.

use std::fmt;

use crate::controller::ControllerSet;
use crate::scheduler::Deadline;

/// One CLI or scheduled invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    /// Set when the invocation comes from the scheduler (`--cron`).
    pub scheduled: bool,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            scheduled: false,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn scheduled(mut self) -> Self {
        self.scheduled = true;
        self
    }

    /// Positional argument by index.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Values handed to a command handler.
///
/// Output written here is captured into the run record for scheduled runs.
#[derive(Debug)]
pub struct CommandContext<'a> {
    command: &'a Command,
    deadline: Deadline,
    controllers: &'a ControllerSet,
    output: String,
}

impl<'a> CommandContext<'a> {
    pub fn new(command: &'a Command, deadline: Deadline, controllers: &'a ControllerSet) -> Self {
        Self {
            command,
            deadline,
            controllers,
            output: String::new(),
        }
    }

    pub fn command(&self) -> &'a Command {
        self.command
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.command.arg(index)
    }

    pub fn is_scheduled(&self) -> bool {
        self.command.scheduled
    }

    /// Cooperative time limit. Long-running bodies must poll it.
    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    /// The registration table the command runs under.
    pub fn controllers(&self) -> &'a ControllerSet {
        self.controllers
    }

    /// Append one line of output.
    pub fn write_line(&mut self, line: impl fmt::Display) {
        self.output.push_str(&line.to_string());
        self.output.push('\n');
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_output_is_captured_line_by_line() {
        let command = Command::new("report").with_args(["daily", "--full"]).scheduled();
        let controllers = ControllerSet::default();
        let deadline = Deadline::new(Duration::from_secs(60));
        let mut ctx = CommandContext::new(&command, deadline, &controllers);

        assert!(ctx.is_scheduled());
        assert_eq!(ctx.arg(0), Some("daily"));
        assert_eq!(ctx.arg(2), None);
        assert!(!ctx.deadline().expired());

        ctx.write_line("step 1");
        ctx.write_line(format_args!("step {}", 2));
        assert_eq!(ctx.into_output(), "step 1\nstep 2\n");
    }
}
