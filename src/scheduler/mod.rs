//! Scheduled command support.
//!
//! # Data Flow
//! ```text
//! scheduler tick (waymark-cli --due)
//!     → cron.rs (which commands are due this minute)
//!     → Dispatcher::run per due command
//!         → deadline.rs (cooperative time limit)
//!         → run_log.rs (open record, run, close record)
//! ```
//!
//! # Design Decisions
//! - Time limits are cooperative; nothing is killed
//! - Only scheduled runs are recorded
//! - Recorder failures are logged, never fatal to the command

pub mod cron;
pub mod deadline;
pub mod run_log;

pub use cron::Schedule;
pub use deadline::Deadline;
pub use run_log::{FinishedRun, RunLog, RunLogError, RunOutcome, RunRecord, RunRecorder, RunStatus};
