//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (host adapter):
//!     → maintenance.rs (503 while the site is down)
//!     → rate_limit.rs (429 per caller)
//!     → Dispatcher
//!         → restriction.rs (one verdict per restriction)
//!         → access.rs (combine into one outcome)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a handler with no restrictions is uncontrolled
//! - Identity storage is external; restrictions only read `User`
//! - "Not applicable" is an outcome, not an error

pub mod access;
pub mod maintenance;
pub mod rate_limit;
pub mod restriction;

pub use access::{resolve, AccessOutcome, Denial};
pub use rate_limit::RateLimiter;
pub use restriction::{
    Anonymous, ContentLevel, ContentRequirement, Custom, LoggedIn, Owner, Public, Restriction,
    Role, TwoFactor, Verdict,
};
