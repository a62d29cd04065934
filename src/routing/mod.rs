//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Handler declaration (at startup):
//!     template → pattern.rs (compile to anchored rules)
//!     predicate name → matcher.rs (resolve against PredicateRegistry)
//!     component / redirect → route_type.rs
//!
//! Incoming Request:
//!     → matcher.rs (does this handler apply?)
//!     → matcher.rs (extract RouteArgs from the winning matcher)
//!     → route_type.rs (build a Renderer)
//! ```
//!
//! # Design Decisions
//! - Templates compiled once at startup, shared read-only
//! - Deterministic: same request always matches the same handler
//! - First match wins (ordered by controller priority, then declaration)

pub mod matcher;
pub mod pattern;
pub mod route_type;

pub use matcher::{
    DelegatedMatcher, DispatchPass, Matcher, NotFoundMatcher, PathMatcher, PredicateRegistry,
    RouteArgs,
};
pub use pattern::PathPattern;
pub use route_type::{infer_kind, Capabilities, Component, ComponentRoute, RedirectRoute, RouteType};
