//! Caller identity as seen by restrictions.

use std::collections::BTreeSet;

/// Role name that passes every role check.
pub const ADMIN_ROLE: &str = "admin";

/// The user on whose behalf a request or command runs.
///
/// Looking users up is the host's job; the core only reads these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: Option<u64>,
    pub username: Option<String>,
    pub roles: BTreeSet<String>,
    /// Highest content level the user is entitled to (subscriptions).
    pub content_level: u32,
    /// Whether a second factor was verified for this session.
    pub two_factor_verified: bool,
}

impl User {
    /// An anonymous visitor.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A logged-in user with no roles.
    pub fn member(id: u64, username: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            username: Some(username.into()),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_content_level(mut self, level: u32) -> Self {
        self.content_level = level;
        self
    }

    pub fn with_two_factor(mut self, verified: bool) -> Self {
        self.two_factor_verified = verified;
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(ADMIN_ROLE)
    }

    /// Admins hold every role.
    pub fn has_role(&self, role: &str) -> bool {
        self.is_admin() || self.roles.contains(role)
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match (&self.id, &self.username) {
            (Some(id), Some(name)) => format!("{}#{}", name, id),
            (Some(id), None) => format!("#{}", id),
            _ => "anonymous".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous() {
        let user = User::anonymous();
        assert!(!user.is_logged_in());
        assert!(!user.has_role("staff"));
        assert_eq!(user.label(), "anonymous");
    }

    #[test]
    fn test_admin_holds_every_role() {
        let user = User::member(1, "root").with_role(ADMIN_ROLE);
        assert!(user.has_role("staff"));
        assert!(user.has_role("billing"));
        assert_eq!(user.label(), "root#1");
    }
}
