//! Per-invocation context.
//!
//! # Data Flow
//! ```text
//! Host (axum server / CLI)
//!     → request.rs (HttpRequest: path, method, four key/value namespaces)
//!     → command.rs (Command: name, args, scheduled flag)
//!     → user.rs (User: identity and grants, resolved by the host)
//!     → passed by reference through the whole dispatch pass
//! ```
//!
//! # Design Decisions
//! - No process-wide "current request"; every value is threaded explicitly
//! - Requests are immutable once built; access outcomes are returned, not stored
//! - One instance per unit of work, never shared between requests

pub mod command;
pub mod handler;
pub mod request;
pub mod user;

pub use command::{Command, CommandContext};
pub use handler::HandlerContext;
pub use request::{HttpRequest, Params};
pub use user::User;
