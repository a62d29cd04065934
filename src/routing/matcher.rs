//! Request matching.
//!
//! # Responsibilities
//! - Match request path against a compiled template, optionally by method
//! - Defer to a named external predicate (delegated matching)
//! - Catch everything during the not-found pass
//!
//! # Design Decisions
//! - Method constraints compare exactly (case-sensitive)
//! - Predicates are resolved when handlers are declared, so a missing one
//!   fails at startup rather than per request
//! - Matchers are stateless and shared across concurrent requests

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::context::HttpRequest;
use crate::error::RegistryError;
use crate::routing::pattern::PathPattern;

/// Which dispatch pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPass {
    /// Normal lookup.
    Primary,
    /// Re-entrant pass after nothing matched.
    NotFound,
}

/// Arguments handed to a matched handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteArgs {
    /// Values of named template parameters, in template order.
    Named(Vec<(String, String)>),
    /// No named parameters; the handler reads the request itself.
    Request,
}

impl RouteArgs {
    pub fn get(&self, name: &str) -> Option<&str> {
        match self {
            Self::Named(values) => values
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            Self::Request => None,
        }
    }

    /// Values in declaration order.
    pub fn positional(&self) -> Vec<&str> {
        match self {
            Self::Named(values) => values.iter().map(|(_, v)| v.as_str()).collect(),
            Self::Request => Vec::new(),
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request)
    }
}

/// Trait for matching requests against a handler.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if the handler applies to this request.
    fn matches(&self, req: &HttpRequest, pass: DispatchPass) -> bool;

    /// Arguments for the handler once this matcher has won.
    fn extract(&self, _req: &HttpRequest) -> RouteArgs {
        RouteArgs::Request
    }

    /// Human-readable form for route listings.
    fn describe(&self) -> String;
}

/// Matches the request path against a template.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: PathPattern,
    method: Option<Method>,
}

impl PathMatcher {
    pub fn new(template: &str) -> Result<Self, RegistryError> {
        Ok(Self {
            pattern: PathPattern::compile(template)?,
            method: None,
        })
    }

    /// Restrict the matcher to one HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, req: &HttpRequest, pass: DispatchPass) -> bool {
        if pass != DispatchPass::Primary {
            return false;
        }
        if let Some(method) = &self.method {
            if req.method() != method {
                return false;
            }
        }
        self.pattern.is_match(req.path())
    }

    fn extract(&self, req: &HttpRequest) -> RouteArgs {
        match self.pattern.extract(req.path()) {
            Some(values) if !values.is_empty() => RouteArgs::Named(values),
            _ => RouteArgs::Request,
        }
    }

    fn describe(&self) -> String {
        match &self.method {
            Some(method) => format!("{} {}", method, self.pattern.template()),
            None => self.pattern.template().to_string(),
        }
    }
}

/// A predicate supplied by an external component.
pub type Predicate = Arc<dyn Fn(&HttpRequest) -> bool + Send + Sync>;

/// Named predicates, keyed by (target, name).
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<(String, String), Predicate>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` on `target` (e.g. `("article", "published_slug")`).
    pub fn register<F>(&mut self, target: &str, name: &str, predicate: F)
    where
        F: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    {
        self.predicates
            .insert((target.to_string(), name.to_string()), Arc::new(predicate));
    }

    /// Build a delegated matcher. An unknown predicate is a configuration error.
    pub fn matcher(&self, target: &str, name: &str) -> Result<DelegatedMatcher, RegistryError> {
        let predicate = self
            .predicates
            .get(&(target.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| RegistryError::UnknownPredicate {
                target: target.to_string(),
                name: name.to_string(),
            })?;
        Ok(DelegatedMatcher {
            target: target.to_string(),
            name: name.to_string(),
            predicate,
        })
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Defers the match decision to an external predicate.
#[derive(Clone)]
pub struct DelegatedMatcher {
    target: String,
    name: String,
    predicate: Predicate,
}

impl fmt::Debug for DelegatedMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedMatcher")
            .field("target", &self.target)
            .field("name", &self.name)
            .finish()
    }
}

impl Matcher for DelegatedMatcher {
    fn matches(&self, req: &HttpRequest, pass: DispatchPass) -> bool {
        pass == DispatchPass::Primary && (self.predicate)(req)
    }

    fn describe(&self) -> String {
        format!("{}::{}()", self.target, self.name)
    }
}

/// Matches anything, but only during the not-found pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundMatcher;

impl Matcher for NotFoundMatcher {
    fn matches(&self, _req: &HttpRequest, pass: DispatchPass) -> bool {
        pass == DispatchPass::NotFound
    }

    fn describe(&self) -> String {
        "<not found>".to_string()
    }
}
