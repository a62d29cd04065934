//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;
use tokio::sync::mpsc;

use waymark::config::{AppConfig, Environment};
use waymark::context::HttpRequest;
use waymark::controller::{Controller, ControllerSetBuilder, Handler};
use waymark::error::{DispatchError, DispatchResult};
use waymark::lifecycle::build_dispatcher;
use waymark::render::{ContentRenderer, Payload, RendererKind};
use waymark::routing::{Capabilities, Component};
use waymark::security::{ContentLevel, Custom, Public, Role, Verdict};
use waymark::{Dispatcher, HttpServer, Shutdown};

/// A reload-capable dashboard widget.
#[derive(Debug)]
pub struct Dashboard;

impl Component for Dashboard {
    fn name(&self) -> &str {
        "dashboard"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::HTML | Capabilities::RELOADABLE
    }

    fn build(&self, ctx: &waymark::context::HandlerContext<'_>) -> DispatchResult<Payload> {
        Ok(Payload::titled(
            "Dashboard",
            format!("<p>Welcome {}</p>", ctx.user().label()),
        ))
    }
}

/// The `site` module: the highest-priority application module.
pub fn site_controller() -> Controller {
    Controller::new("site", "site")
        .handler(
            Handler::new("site.users_list")
                .path("users/list")
                .unwrap()
                .restrict(Role::new("staff"))
                .action(|_| Ok(ContentRenderer::page("Users", "<ul><li>ada</li></ul>"))),
        )
        .handler(
            Handler::new("site.article")
                .path("articles/:slug")
                .unwrap()
                .restrict(Public)
                .restrict(ContentLevel::new(2, "premium articles"))
                .action(|ctx| {
                    let slug = ctx.arg("slug").unwrap_or_default();
                    let body = match ctx.roadblock() {
                        Some(required) => {
                            format!("teaser of {slug}; subscribe to {}", required.content)
                        }
                        None => format!("full text of {slug}"),
                    };
                    Ok(ContentRenderer::page(slug.to_string(), body))
                }),
        )
        .handler(
            Handler::new("site.premium_report")
                .path("reports/premium")
                .unwrap()
                .restrict(ContentLevel::new(3, "reports"))
                .full_page_roadblock()
                .action(|_| Ok(ContentRenderer::page("Report", "numbers"))),
        )
        .handler(
            Handler::new("site.gift")
                .path("gifts/add-gift")
                .unwrap()
                .restrict(Public)
                .action(|_| Ok(ContentRenderer::text("gift added"))),
        )
        .handler(
            Handler::new("site.boom")
                .path("boom")
                .unwrap()
                .restrict(Public)
                .action(|_| -> DispatchResult<ContentRenderer> {
                    Err(DispatchError::handler("database connection refused"))
                }),
        )
        .handler(
            Handler::new("site.panic")
                .path("panic")
                .unwrap()
                .restrict(Public)
                .action(|_| -> DispatchResult<ContentRenderer> { panic!("handler blew up") }),
        )
        .handler(
            Handler::new("site.open")
                .path("open")
                .unwrap()
                .action(|_| Ok(ContentRenderer::text("should never render"))),
        )
        .handler(
            Handler::new("site.beta")
                .path("beta")
                .unwrap()
                .restrict(Custom::new("beta-cookie", |_, req: &HttpRequest| {
                    if req.cookies().contains("beta") {
                        Verdict::Allowed
                    } else {
                        Verdict::Unmatched
                    }
                }))
                .action(|_| Ok(ContentRenderer::text("beta"))),
        )
        .handler(
            Handler::new("site.beta_fallback")
                .path("beta")
                .unwrap()
                .restrict(Public)
                .action(|_| Ok(ContentRenderer::text("stable"))),
        )
        .handler(
            Handler::new("site.old_home")
                .path("old-home")
                .unwrap()
                .redirect("/")
                .unwrap()
                .restrict(Public),
        )
        .handler(
            Handler::new("site.dashboard")
                .path("dashboard")
                .unwrap()
                .restrict(Public)
                .component(Arc::new(Dashboard)),
        )
        .handler(
            Handler::new("site.delete_user")
                .route(Method::POST, "users/:id/delete")
                .unwrap()
                .restrict(Public)
                .status(StatusCode::ACCEPTED)
                .action(|ctx| {
                    let id = ctx.arg("id").unwrap_or_default();
                    Ok(ContentRenderer::text(format!("deleted {id}")))
                }),
        )
}

/// The `cms` module: lower priority, shadowed by `site` on `users/list`.
pub fn cms_controller() -> Controller {
    Controller::new("cms", "cms")
        .output(RendererKind::Json)
        .handler(
            Handler::new("cms.users_list")
                .path("users/list")
                .unwrap()
                .restrict(Public)
                .action(|_| Ok(ContentRenderer::json(json!({"source": "cms"})))),
        )
        .handler(
            Handler::new("cms.page")
                .path("pages/*")
                .unwrap()
                .restrict(Public)
                .action(|ctx| {
                    if ctx.request().path().ends_with("missing") {
                        return Err(DispatchError::not_found("page"));
                    }
                    Ok(ContentRenderer::json(json!({"path": ctx.request().path()})))
                }),
        )
}

pub fn app_controllers() -> ControllerSetBuilder {
    ControllerSetBuilder::new()
        .register(cms_controller())
        .register(site_controller())
}

pub fn config(environment: Environment) -> AppConfig {
    let mut config = AppConfig::default();
    config.environment.name = environment;
    config.dispatch.controller_order = vec!["site".into(), "cms".into()];
    config
}

/// Production dispatcher over the site and cms modules plus the built-ins.
pub fn dispatcher() -> Dispatcher {
    dispatcher_in(Environment::Production)
}

pub fn dispatcher_in(environment: Environment) -> Dispatcher {
    build_dispatcher(&config(environment), app_controllers()).unwrap()
}

pub struct TestServer {
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<AppConfig>,
}

/// Start a live server on `addr` and wait until it accepts connections.
pub async fn start_server(addr: SocketAddr, mut config: AppConfig) -> TestServer {
    config.listener.bind_address = addr.to_string();
    let dispatcher = Arc::new(build_dispatcher(&config, app_controllers()).unwrap());

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, dispatcher);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    TestServer {
        shutdown,
        config_updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
