//! Access restrictions attached to handlers.
//!
//! A restriction is a stateless policy that looks at the caller and returns
//! a [`Verdict`]. Handlers may carry several; [`crate::security::access`]
//! combines them.

use std::fmt;
use std::sync::Arc;

use crate::context::{HttpRequest, User};

/// What the restriction requires when it roadblocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequirement {
    /// Subscription level needed; higher is more restrictive.
    pub level: u32,
    /// Name of the gated content or product, for the paywall page.
    pub content: String,
}

impl ContentRequirement {
    pub fn new(level: u32, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
        }
    }
}

/// Verdict of one restriction for one caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    /// Gated content; fatal only on full-page roadblock handlers.
    Roadblocked(ContentRequirement),
    Forbidden,
    LoginRequired,
    /// No access declared. Restrictions may return it to fail closed.
    Uncontrolled,
    /// The handler does not apply to this caller; try the next candidate.
    Unmatched,
}

impl Verdict {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Roadblocked(_) => "roadblocked",
            Self::Forbidden => "forbidden",
            Self::LoginRequired => "login_required",
            Self::Uncontrolled => "uncontrolled",
            Self::Unmatched => "unmatched",
        }
    }
}

/// Trait for access policies.
pub trait Restriction: Send + Sync + fmt::Debug {
    fn access(&self, user: &User, req: &HttpRequest) -> Verdict;

    /// Human-readable form for route listings.
    fn describe(&self) -> String;
}

/// Anyone may call the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Public;

impl Restriction for Public {
    fn access(&self, _user: &User, _req: &HttpRequest) -> Verdict {
        Verdict::Allowed
    }

    fn describe(&self) -> String {
        "public".to_string()
    }
}

/// Any logged-in user.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggedIn;

impl Restriction for LoggedIn {
    fn access(&self, user: &User, _req: &HttpRequest) -> Verdict {
        if user.is_logged_in() {
            Verdict::Allowed
        } else {
            Verdict::LoginRequired
        }
    }

    fn describe(&self) -> String {
        "logged-in".to_string()
    }
}

/// Only visitors who are not logged in (sign-up pages and the like).
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Restriction for Anonymous {
    fn access(&self, user: &User, _req: &HttpRequest) -> Verdict {
        if user.is_logged_in() {
            Verdict::Forbidden
        } else {
            Verdict::Allowed
        }
    }

    fn describe(&self) -> String {
        "anonymous".to_string()
    }
}

/// Holders of at least one of the listed roles.
#[derive(Debug, Clone)]
pub struct Role {
    roles: Vec<String>,
}

impl Role {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            roles: vec![role.into()],
        }
    }

    pub fn any<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl Restriction for Role {
    fn access(&self, user: &User, _req: &HttpRequest) -> Verdict {
        if !user.is_logged_in() {
            Verdict::LoginRequired
        } else if self.roles.iter().any(|r| user.has_role(r)) {
            Verdict::Allowed
        } else {
            Verdict::Forbidden
        }
    }

    fn describe(&self) -> String {
        format!("role({})", self.roles.join("|"))
    }
}

/// The user owns the resource named by a request parameter.
///
/// Compares the user id with the value of `param` in the posted body or
/// query string. Administrators always pass.
#[derive(Debug, Clone)]
pub struct Owner {
    param: String,
}

impl Owner {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }
}

impl Restriction for Owner {
    fn access(&self, user: &User, req: &HttpRequest) -> Verdict {
        let Some(id) = user.id else {
            return Verdict::LoginRequired;
        };
        if user.is_admin() {
            return Verdict::Allowed;
        }
        match req.param(&self.param).and_then(|v| v.parse::<u64>().ok()) {
            Some(owner) if owner == id => Verdict::Allowed,
            _ => Verdict::Forbidden,
        }
    }

    fn describe(&self) -> String {
        format!("owner({})", self.param)
    }
}

/// A verified second factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoFactor;

impl Restriction for TwoFactor {
    fn access(&self, user: &User, _req: &HttpRequest) -> Verdict {
        if !user.is_logged_in() {
            Verdict::LoginRequired
        } else if user.two_factor_verified {
            Verdict::Allowed
        } else {
            Verdict::Forbidden
        }
    }

    fn describe(&self) -> String {
        "two-factor".to_string()
    }
}

/// Paywalled content: users below `level` are roadblocked, not refused.
#[derive(Debug, Clone)]
pub struct ContentLevel {
    requirement: ContentRequirement,
}

impl ContentLevel {
    pub fn new(level: u32, content: impl Into<String>) -> Self {
        Self {
            requirement: ContentRequirement::new(level, content),
        }
    }
}

impl Restriction for ContentLevel {
    fn access(&self, user: &User, _req: &HttpRequest) -> Verdict {
        if user.is_admin() || user.content_level >= self.requirement.level {
            Verdict::Allowed
        } else {
            Verdict::Roadblocked(self.requirement.clone())
        }
    }

    fn describe(&self) -> String {
        format!("content-level({})", self.requirement.level)
    }
}

/// A policy supplied as a closure.
#[derive(Clone)]
pub struct Custom {
    name: String,
    check: Arc<dyn Fn(&User, &HttpRequest) -> Verdict + Send + Sync>,
}

impl Custom {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&User, &HttpRequest) -> Verdict + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custom").field("name", &self.name).finish()
    }
}

impl Restriction for Custom {
    fn access(&self, user: &User, req: &HttpRequest) -> Verdict {
        (self.check)(user, req)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
