//! Verdict combination.
//!
//! # Rules
//! - No restrictions at all → uncontrolled (fail closed)
//! - First forbidden, login-required, uncontrolled or unmatched verdict stops
//!   evaluation
//! - Roadblocks do not stop evaluation; the highest required level is kept
//!   (ties keep the first)
//! - Allowed has no effect

use std::sync::Arc;

use crate::context::HttpRequest;
use crate::error::DispatchError;
use crate::security::restriction::{ContentRequirement, Restriction, Verdict};

/// Terminal refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Forbidden,
    LoginRequired,
    Uncontrolled,
}

impl From<Denial> for DispatchError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Forbidden => DispatchError::Forbidden,
            Denial::LoginRequired => DispatchError::LoginRequired,
            Denial::Uncontrolled => DispatchError::Uncontrolled,
        }
    }
}

/// Combined result of all restrictions on one handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Allowed,
    /// Passed, but gated content was found; the requirement is handed on.
    Roadblocked(ContentRequirement),
    Denied(Denial),
    /// A restriction said this handler does not apply.
    NotApplicable,
}

impl AccessOutcome {
    /// The single verdict this outcome stands for.
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Allowed => Verdict::Allowed,
            Self::Roadblocked(req) => Verdict::Roadblocked(req.clone()),
            Self::Denied(Denial::Forbidden) => Verdict::Forbidden,
            Self::Denied(Denial::LoginRequired) => Verdict::LoginRequired,
            Self::Denied(Denial::Uncontrolled) => Verdict::Uncontrolled,
            Self::NotApplicable => Verdict::Unmatched,
        }
    }
}

/// Resolve access for the request's user against a handler's restrictions.
pub fn resolve(restrictions: &[Arc<dyn Restriction>], req: &HttpRequest) -> AccessOutcome {
    if restrictions.is_empty() {
        return AccessOutcome::Denied(Denial::Uncontrolled);
    }

    let user = req.user();
    let mut roadblock: Option<ContentRequirement> = None;

    for restriction in restrictions {
        match restriction.access(user, req) {
            Verdict::Allowed => {}
            Verdict::Forbidden => return AccessOutcome::Denied(Denial::Forbidden),
            Verdict::LoginRequired => return AccessOutcome::Denied(Denial::LoginRequired),
            Verdict::Uncontrolled => return AccessOutcome::Denied(Denial::Uncontrolled),
            Verdict::Unmatched => return AccessOutcome::NotApplicable,
            Verdict::Roadblocked(required) => {
                let replace = roadblock
                    .as_ref()
                    .map_or(true, |current| required.level > current.level);
                if replace {
                    roadblock = Some(required);
                }
            }
        }
    }

    match roadblock {
        Some(required) => AccessOutcome::Roadblocked(required),
        None => AccessOutcome::Allowed,
    }
}
