//! The built-in `system` controller.
//!
//! Registered after every application controller, so any module may
//! shadow these handlers by declaring its own.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use html_escape::encode_text;
use serde_json::json;

use crate::controller::{Controller, Handler};
use crate::error::{DispatchError, RegistryError};
use crate::render::{ContentRenderer, RendererKind};
use crate::scheduler::RunLog;
use crate::security::Public;

pub const MODULE: &str = "system";

/// Days of run records `runs:prune` keeps by default.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

pub fn system_controller(run_log: RunLog) -> Result<Controller, RegistryError> {
    let health = Handler::new("system.health")
        .route(Method::GET, "health")?
        .restrict(Public)
        .action(|_| {
            Ok(ContentRenderer::json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
            })))
        });

    let not_found = Handler::new("system.not_found")
        .not_found()
        .restrict(Public)
        .status(StatusCode::NOT_FOUND)
        .action(|ctx| {
            Ok(ContentRenderer::page(
                "Page not found",
                format!(
                    "<h1>Page not found</h1>\n<p>Nothing lives at {}.</p>",
                    encode_text(ctx.request().path())
                ),
            ))
        });

    let routes = Handler::new("system.routes").command("routes", |ctx| {
        for line in ctx.controllers().describe() {
            ctx.write_line(line);
        }
        Ok(())
    });

    let prune = Handler::new("system.runs_prune")
        .command("runs:prune", move |ctx| {
            let days = match ctx.arg(0) {
                Some(raw) => raw
                    .parse::<i64>()
                    .ok()
                    .filter(|d| *d >= 0)
                    .ok_or_else(|| DispatchError::handler(format!("invalid day count '{raw}'")))?,
                None => DEFAULT_RETENTION_DAYS,
            };
            let cutoff = Utc::now() - chrono::Duration::days(days);
            let removed = run_log
                .prune(cutoff, ctx.deadline())
                .map_err(|e| DispatchError::with_code(500, e.to_string()))?;
            ctx.write_line(format!("pruned {removed} run records older than {days} days"));
            Ok(())
        })
        .time_limit(Duration::from_secs(60));

    Ok(Controller::new("system", MODULE)
        .output(RendererKind::Text)
        .handler(health)
        .handler(routes)
        .handler(prune)
        .handler(not_found))
}
