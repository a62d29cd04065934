//! Cooperative wall-clock limits for commands.

use std::time::{Duration, Instant};

/// A time limit the command body checks for itself.
///
/// Nothing is interrupted when the deadline passes; the body is expected
/// to poll [`Deadline::expired`] between units of work and stop early.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit: Some(limit),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            started: Instant::now(),
            limit: None,
        }
    }

    pub fn from_limit(limit: Option<Duration>) -> Self {
        match limit {
            Some(limit) => Self::new(limit),
            None => Self::unlimited(),
        }
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn expired(&self) -> bool {
        self.limit.is_some_and(|limit| self.started.elapsed() >= limit)
    }

    /// Time left, or `None` when unlimited.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit
            .map(|limit| limit.saturating_sub(self.started.elapsed()))
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::unlimited()
    }
}
