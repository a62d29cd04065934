//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Resolve the log filter from `RUST_LOG` or the configured level
//!
//! # Design Decisions
//! - `RUST_LOG` beats config so operators can raise verbosity ad hoc
//! - A bad filter string falls back to the default rather than aborting

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor config say otherwise.
pub const DEFAULT_FILTER: &str = "waymark=info,tower_http=info";

/// Build the filter directive for a configured level.
pub fn filter_directive(level: Option<&str>) -> String {
    match level {
        Some(level) if !level.trim().is_empty() => {
            format!("waymark={level},tower_http={level}", level = level.trim())
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(level)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(None), DEFAULT_FILTER);
        assert_eq!(filter_directive(Some(" ")), DEFAULT_FILTER);
        assert_eq!(filter_directive(Some("debug")), "waymark=debug,tower_http=debug");
    }
}
