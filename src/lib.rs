//! waymark: request dispatch, access control and render selection.
//!
//! Application modules declare controllers; the [`Dispatcher`] finds the one
//! handler responsible for each HTTP request or command, checks the caller
//! against its restrictions and renders the output in the right shape.

// Core
pub mod context;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod render;
pub mod routing;
pub mod scheduler;
pub mod security;

// Host adapter
pub mod builtin;
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::AppConfig;
pub use context::{Command, HttpRequest, User};
pub use controller::{Controller, ControllerSet, Handler};
pub use dispatch::Dispatcher;
pub use error::{DispatchError, DispatchResult, RegistryError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use render::Response;
