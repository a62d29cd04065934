//! Error taxonomy for dispatch and command execution.
//!
//! # Kinds
//! - Access: forbidden, login required, uncontrolled, full-page roadblock.
//!   Always rendered through a pre-built error renderer.
//! - Resource: not found. Rendered as 404 with a user-safe message.
//! - Throttle / Unavailable: rate limit (429) and maintenance (503).
//! - Generic: anything else raised by a handler. Logged with request context,
//!   rendered with a message gated by caller identity and environment.
//!
//! "This handler does not apply" is not an error; see
//! [`crate::security::AccessOutcome::NotApplicable`].

use axum::http::StatusCode;
use thiserror::Error;

/// Message shown in place of generic error detail when detail is not revealed.
pub const GENERIC_MESSAGE: &str = "Something went wrong. The error has been logged.";

/// Errors raised while dispatching a request or running a command.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The caller is known but not permitted.
    #[error("You do not have permission to access this page")]
    Forbidden,

    /// The caller must log in first.
    #[error("You must be logged in to access this page")]
    LoginRequired,

    /// The handler declares no restriction at all.
    #[error("No access specified for this page")]
    Uncontrolled,

    /// Paywalled content on a full-page roadblock handler.
    #[error("A subscription at level {level} is required to view this page")]
    Roadblocked { level: u32 },

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Too many requests from one caller.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The site is in maintenance mode.
    #[error("The site is down for maintenance")]
    Maintenance,

    /// A handler failed with a declared status code.
    #[error("{message}")]
    Handler { code: u16, message: String },

    /// A renderer could not serialize its data.
    #[error("Render error: {0}")]
    Render(String),

    /// A handler panicked.
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// A command failed; carries the display-safe message.
    #[error("Command '{command}' failed: {message}")]
    Command { command: String, message: String },
}

/// Coarse classification used by the dispatcher and for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Access,
    Resource,
    Throttle,
    Unavailable,
    Generic,
}

impl DispatchError {
    /// Generic error with the default status code (400).
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            code: 400,
            message: message.into(),
        }
    }

    /// Generic error with an explicit status code.
    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Handler {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Forbidden
            | Self::LoginRequired
            | Self::Uncontrolled
            | Self::Roadblocked { .. } => ErrorKind::Access,
            Self::NotFound(_) => ErrorKind::Resource,
            Self::RateLimited => ErrorKind::Throttle,
            Self::Maintenance => ErrorKind::Unavailable,
            Self::Handler { .. } | Self::Render(_) | Self::Panicked(_) | Self::Command { .. } => {
                ErrorKind::Generic
            }
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden
            | Self::LoginRequired
            | Self::Uncontrolled
            | Self::Roadblocked { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
            // Only error codes; anything else is a plain bad request
            Self::Handler { code: code @ 400..=599, .. } => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_REQUEST)
            }
            Self::Handler { .. } => StatusCode::BAD_REQUEST,
            Self::Render(_) | Self::Panicked(_) | Self::Command { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the caller.
    ///
    /// Access, resource, throttle and maintenance messages never carry
    /// internal detail and are always shown. Generic errors only show their
    /// detail when `reveal` is set.
    pub fn public_message(&self, reveal: bool) -> String {
        match self.kind() {
            ErrorKind::Generic if !reveal => GENERIC_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    /// Wraps a command failure, applying the same display rules as HTTP errors.
    pub fn command(command: &str, source: &DispatchError, reveal: bool) -> Self {
        Self::Command {
            command: command.to_string(),
            message: source.public_message(reveal),
        }
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors found while building the handler registration table.
///
/// These are configuration mistakes and are fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown predicate '{name}' on '{target}'")]
    UnknownPredicate { target: String, name: String },

    #[error("Invalid path template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid cron expression '{expr}': {reason}")]
    InvalidSchedule { expr: String, reason: String },

    #[error("Invalid redirect target '{0}'")]
    InvalidRedirect(String),

    #[error("Command '{0}' is declared more than once")]
    DuplicateCommand(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DispatchError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(DispatchError::LoginRequired.status(), StatusCode::FORBIDDEN);
        assert_eq!(DispatchError::Uncontrolled.status(), StatusCode::FORBIDDEN);
        assert_eq!(DispatchError::Roadblocked { level: 2 }.status(), StatusCode::FORBIDDEN);
        assert_eq!(DispatchError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(DispatchError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(DispatchError::Maintenance.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(DispatchError::handler("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(DispatchError::with_code(409, "dup").status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_declared_code_falls_back_to_400() {
        let err = DispatchError::with_code(42, "odd");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_success_and_redirect_codes_are_not_error_statuses() {
        for code in [200, 204, 302, 399, 600] {
            let err = DispatchError::with_code(code, "not an error");
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{code}");
        }
        assert_eq!(DispatchError::with_code(404, "gone").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            DispatchError::with_code(503, "later").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_public_message_gating() {
        let err = DispatchError::handler("db password rejected");
        assert_eq!(err.public_message(false), GENERIC_MESSAGE);
        assert_eq!(err.public_message(true), "db password rejected");

        // Access messages are always safe to show
        let err = DispatchError::LoginRequired;
        assert_eq!(err.public_message(false), err.to_string());
    }

    #[test]
    fn test_command_wrapping() {
        let source = DispatchError::handler("disk full");
        let wrapped = DispatchError::command("backup", &source, false);
        assert_eq!(wrapped.to_string(), format!("Command 'backup' failed: {}", GENERIC_MESSAGE));
        let wrapped = DispatchError::command("backup", &source, true);
        assert!(wrapped.to_string().contains("disk full"));
    }
}
