mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{Method, StatusCode};

use waymark::config::Environment;
use waymark::context::{HttpRequest, Params, User};
use waymark::controller::{Controller, ControllerSet, Handler};
use waymark::dispatch::{DispatchSettings, Dispatcher};
use waymark::error::GENERIC_MESSAGE;
use waymark::lifecycle::build_dispatcher;
use waymark::render::ContentRenderer;
use waymark::security::{Custom, Verdict};

fn staff() -> User {
    User::member(7, "grace").with_role("staff")
}

#[test]
fn test_users_list_anonymous_requires_login() {
    let response = common::dispatcher().respond(&HttpRequest::get("users/list"));
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.handler.as_deref(), Some("site.users_list"));
    assert!(response.body.contains("You must be logged in"));
}

#[test]
fn test_users_list_member_without_role_is_forbidden() {
    let req = HttpRequest::get("users/list").with_user(User::member(8, "bob"));
    let response = common::dispatcher().respond(&req);
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body.contains("You do not have permission"));
}

#[test]
fn test_users_list_staff_is_served_by_site() {
    let req = HttpRequest::get("/users/list/").with_user(staff());
    let response = common::dispatcher().respond(&req);
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<li>ada</li>"));
}

#[test]
fn test_higher_priority_module_wins_every_time() {
    let dispatcher = common::dispatcher();
    for _ in 0..20 {
        let response = dispatcher.respond(&HttpRequest::get("users/list"));
        assert_eq!(response.handler.as_deref(), Some("site.users_list"));
    }

    // Flip the order and the public cms handler takes over.
    let mut config = common::config(Environment::Production);
    config.dispatch.controller_order = vec!["cms".into(), "site".into()];
    let flipped = build_dispatcher(&config, common::app_controllers()).unwrap();
    let response = flipped.respond(&HttpRequest::get("users/list"));
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, r#"{"source":"cms"}"#);
}

#[test]
fn test_unregistered_path_gets_builtin_not_found() {
    let response = common::dispatcher().respond(&HttpRequest::get("no/such/page"));
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.handler.as_deref(), Some("system.not_found"));
}

#[test]
fn test_not_found_pass_runs_exactly_once() {
    let passes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&passes);

    let controllers = ControllerSet::builder()
        .register(
            Controller::new("fallback", "fallback").handler(
                Handler::new("fallback.count")
                    .not_found()
                    .restrict(Custom::new("count", move |_, _| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Verdict::Unmatched
                    }))
                    .action(|_| Ok(ContentRenderer::text("unreachable"))),
            ),
        )
        .build(&[])
        .unwrap();
    let dispatcher = Dispatcher::new(controllers, DispatchSettings::default());

    let response = dispatcher.respond(&HttpRequest::get("missing"));
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, "Not Found");
    assert!(response.handler.is_none());
    assert_eq!(passes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_not_found_fallback_can_be_disabled() {
    let mut config = common::config(Environment::Production);
    config.dispatch.not_found_fallback = false;
    let dispatcher = build_dispatcher(&config, common::app_controllers()).unwrap();
    let response = dispatcher.respond(&HttpRequest::get("missing"));
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.handler.is_none());
}

#[test]
fn test_soft_roadblock_hands_requirement_to_handler() {
    let dispatcher = common::dispatcher();

    let response = dispatcher.respond(&HttpRequest::get("articles/rust%20tips"));
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("teaser of rust tips; subscribe to premium articles"));

    let subscriber = User::member(3, "sub").with_content_level(2);
    let request = HttpRequest::get("articles/rust-tips").with_user(subscriber);
    let response = dispatcher.respond(&request);
    assert!(response.body.contains("full text of rust-tips"));
}

#[test]
fn test_full_page_roadblock_shows_paywall() {
    let dispatcher = common::dispatcher();

    let response = dispatcher.respond(&HttpRequest::get("reports/premium"));
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body.contains(r#"data-level="3""#));

    let subscriber = User::member(3, "sub").with_content_level(3);
    let response = dispatcher.respond(&HttpRequest::get("reports/premium").with_user(subscriber));
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("numbers"));
}

#[test]
fn test_no_restrictions_is_uncontrolled_even_for_admin() {
    let admin = User::member(1, "root").with_role("admin");
    let response = common::dispatcher().respond(&HttpRequest::get("open").with_user(admin));
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body.contains("No access specified"));
}

#[test]
fn test_generic_error_detail_is_gated() {
    let production = common::dispatcher();
    let response = production.respond(&HttpRequest::get("boom"));
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains(GENERIC_MESSAGE));
    assert!(!response.body.contains("database connection refused"));

    let admin = User::member(1, "root").with_role("admin");
    let response = production.respond(&HttpRequest::get("boom").with_user(admin));
    assert!(response.body.contains("database connection refused"));

    let development = common::dispatcher_in(Environment::Development);
    let response = development.respond(&HttpRequest::get("boom"));
    assert!(response.body.contains("database connection refused"));
}

#[test]
fn test_settings_reload_changes_gating() {
    let dispatcher = common::dispatcher();
    dispatcher.update_settings(DispatchSettings {
        environment: Environment::Staging,
        ..DispatchSettings::default()
    });
    let response = dispatcher.respond(&HttpRequest::get("boom"));
    assert!(response.body.contains("database connection refused"));
}

#[test]
fn test_panic_becomes_server_error() {
    let response = common::dispatcher().respond(&HttpRequest::get("panic"));
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body.contains(GENERIC_MESSAGE));
}

#[test]
fn test_panicking_restriction_becomes_server_error() {
    let controllers = ControllerSet::builder()
        .register(
            Controller::new("staff", "staff").handler(
                Handler::new("staff.roster")
                    .path("roster")
                    .unwrap()
                    .restrict(Custom::new("role-store", |_, _| panic!("role store down")))
                    .action(|_| Ok(ContentRenderer::text("roster"))),
            ),
        )
        .build(&[])
        .unwrap();
    let dispatcher = Dispatcher::new(controllers, DispatchSettings::default());

    let response = dispatcher.respond(&HttpRequest::get("roster"));
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.handler.as_deref(), Some("staff.roster"));
    assert!(response.body.contains(GENERIC_MESSAGE));
    assert!(!response.body.contains("role store down"));

    // The dispatcher keeps serving after the panic.
    let response = dispatcher.respond(&HttpRequest::get("elsewhere"));
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_unmatched_restriction_tries_next_handler() {
    let dispatcher = common::dispatcher();

    let response = dispatcher.respond(&HttpRequest::get("beta"));
    assert_eq!(response.body, "stable");

    let cookies = Params::from_iter([("beta", "1")]);
    let response = dispatcher.respond(&HttpRequest::get("beta").with_cookies(cookies));
    assert_eq!(response.body, "beta");
}

#[test]
fn test_hyphen_stripped_path_matches() {
    let response = common::dispatcher().respond(&HttpRequest::get("gifts/addgift"));
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "gift added");
}

#[test]
fn test_redirect_route() {
    let response = common::dispatcher().respond(&HttpRequest::get("old-home"));
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location.as_deref(), Some("/"));
}

#[test]
fn test_component_renders_fragment_on_reload() {
    let dispatcher = common::dispatcher();

    let page = dispatcher.respond(&HttpRequest::get("dashboard"));
    assert!(page.body.contains("<title>Dashboard</title>"));

    let fragment = dispatcher.respond(&HttpRequest::get("dashboard").with_reload(true));
    assert_eq!(fragment.body, "<p>Welcome anonymous</p>");
}

#[test]
fn test_method_constraint_and_declared_status() {
    let dispatcher = common::dispatcher();

    let response = dispatcher.respond(&HttpRequest::new(Method::POST, "users/12/delete"));
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body, "deleted 12");

    let response = dispatcher.respond(&HttpRequest::get("users/12/delete"));
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_wildcard_and_not_found_signal_in_json() {
    let dispatcher = common::dispatcher();

    let response = dispatcher.respond(&HttpRequest::get("pages/a/b/c"));
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type, "application/json");

    let response = dispatcher.respond(&HttpRequest::get("pages/missing"));
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.content_type, "application/json");
    assert!(response.body.contains(r#""status":404"#));
}
