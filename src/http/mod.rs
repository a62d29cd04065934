//! HTTP host adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, graceful shutdown)
//!     → request.rs (request ID, convert to HttpRequest)
//!     → auth.rs (identify the caller)
//!     → security middleware (maintenance, rate limit)
//!     → Dispatcher::respond on a blocking thread
//!     → response.rs (render::Response → HTTP response)
//!     → Send to client
//! ```

pub mod auth;
pub mod request;
pub mod response;
pub mod server;

pub use auth::{Authenticator, HeaderAuthenticator};
pub use request::{to_http_request, RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
