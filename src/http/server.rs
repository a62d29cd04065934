//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with a single fallback into the dispatcher
//! - Wire up middleware (trace, request ID, timeout, body limit,
//!   maintenance, rate limit)
//! - Apply config reloads to the live state
//! - Serve until shutdown is signalled

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::dispatch::{DispatchSettings, Dispatcher};
use crate::error::DispatchError;
use crate::http::auth::{Authenticator, HeaderAuthenticator};
use crate::http::request::{to_http_request, RequestIdLayer};
use crate::http::response::error_response;
use crate::security::maintenance::maintenance_middleware;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub config: Arc<ArcSwap<AppConfig>>,
    pub authenticator: Arc<dyn Authenticator>,
    pub limiter: Arc<RateLimiter>,
}

/// HTTP front end for a [`Dispatcher`].
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Server that identifies callers from trusted `X-User-*` headers.
    pub fn new(config: AppConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self::with_authenticator(config, dispatcher, Arc::new(HeaderAuthenticator))
    }

    pub fn with_authenticator(
        config: AppConfig,
        dispatcher: Arc<Dispatcher>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let state = AppState {
            dispatcher,
            config: Arc::new(ArcSwap::from_pointee(config.clone())),
            authenticator,
            limiter: Arc::new(RateLimiter::new()),
        };
        let router = Self::build_router(&config, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost first: trace, request ID, timeout, body limit,
    /// maintenance, rate limit, then dispatch.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
            .layer(middleware::from_fn_with_state(state.clone(), maintenance_middleware))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires, applying config updates as
    /// they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                state
                    .dispatcher
                    .update_settings(DispatchSettings::from(&new_config));
                tracing::info!(
                    maintenance = new_config.environment.maintenance,
                    rate_limit = new_config.rate_limit.enabled,
                    "Configuration reloaded"
                );
                state.config.store(Arc::new(new_config));
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Feed every request into the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let max_body = state.config.load().security.max_body_size;
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, max_body).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Could not read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let req = to_http_request(&parts, &bytes, state.authenticator.as_ref());
    let dispatcher = Arc::clone(&state.dispatcher);

    match tokio::task::spawn_blocking(move || dispatcher.respond(&req)).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!(path = %parts.uri.path(), error = %e, "Dispatch task failed");
            error_response(&DispatchError::Panicked(e.to_string()))
        }
    }
}
