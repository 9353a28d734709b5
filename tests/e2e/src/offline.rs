//! Offline behaviour and version upgrades

use alloc::sync::Arc;

use shell_worker::{
    FetchOutcome, NetworkError, Request, RequestMethod, Response, Scope, ServiceWorkerState,
    WorkerError,
};

use crate::assertions::{assert_contains, assert_generations, assert_serves_shell};
use crate::fixtures::{seed_generations, App, AssetFixtures, ENTRY_CHUNK, MENU_JSON, SHELL_MARKER};

#[test]
fn test_every_offline_navigation_gets_the_shell() {
    let app = App::new();
    app.deploy("v1").unwrap();
    app.go_offline();

    for url in [
        "https://app.test/",
        "/",
        "/orders",
        "/orders/12?tab=items",
        "/kitchen?station=grill#top",
        "https://app.test/settings/profile?ref=push",
    ] {
        let result = app.fetch(&Request::navigate(url));
        if let Err(e) = assert_serves_shell(&result) {
            panic!("{}: {}", url, e);
        }
    }
}

#[test]
fn test_deep_link_seen_online_is_replayed_offline() {
    let app = App::new();
    let page = alloc::format!("{}<p>order 12</p>", SHELL_MARKER);
    app.net.route("/orders/12", Response::ok_with_body(page.clone()));
    let worker = app.deploy("v1").unwrap();

    let live = app.fetch(&Request::navigate("/orders/12")).unwrap();
    assert_eq!(live.body, page.as_bytes());
    assert!(app
        .caches
        .read()
        .match_in(worker.cache_names().runtime(), "/orders/12")
        .is_some());

    app.go_offline();
    let offline = app.fetch(&Request::navigate("/orders/12")).unwrap();
    let body = core::str::from_utf8(&offline.body).unwrap();
    assert_contains(body, "order 12").unwrap();
}

#[test]
fn test_assets_are_served_byte_identical() {
    let app = App::new();
    let photo = AssetFixtures::binary(42, 4096);
    app.net.route(
        "/uploads/dish-9.jpg",
        Response::ok_with_body(photo.clone()).with_header("Content-Type", "image/jpeg"),
    );
    app.deploy("v1").unwrap();

    let urls = [MENU_JSON, ENTRY_CHUNK, "/uploads/dish-9.jpg", "/icons/icon-512.png"];
    let live: alloc::vec::Vec<Response> = urls
        .iter()
        .map(|url| app.fetch(&Request::get(*url)).unwrap())
        .collect();

    app.go_offline();
    for (url, expected) in urls.iter().zip(&live) {
        let cached = app.fetch(&Request::get(*url)).unwrap();
        assert_eq!(&cached, expected, "{}", url);
    }
    assert_eq!(live[2].body, photo);
}

#[test]
fn test_cache_busted_asset_falls_back_to_bare_path() {
    let app = App::new();
    let worker = app.deploy("v1").unwrap();
    app.fetch(&Request::get(ENTRY_CHUNK)).unwrap();
    app.go_offline();

    let busted = alloc::format!("{}?v=1700000000", ENTRY_CHUNK);
    match worker.handle_fetch(&Request::get(busted)) {
        FetchOutcome::Responded { response, .. } => {
            assert_eq!(response.body, b"import('./Feed-3f2a.js')");
        }
        other => panic!("expected a cached response, got {:?}", other),
    }
}

#[test]
fn test_error_responses_are_never_cached() {
    let app = App::new();
    let worker = app.deploy("v1").unwrap();

    let missing = app.fetch(&Request::get("/api/missing.json")).unwrap();
    assert_eq!(missing.status, 404);
    assert!(app
        .caches
        .read()
        .match_in(worker.cache_names().runtime(), "/api/missing.json")
        .is_none());

    app.go_offline();
    assert_eq!(
        app.fetch(&Request::get("/api/missing.json")),
        Err(NetworkError::Offline)
    );
}

#[test]
fn test_writes_and_foreign_requests_bypass_the_worker() {
    let app = App::new();
    let worker = app.deploy("v1").unwrap();

    let post = Request::get("/api/orders").with_method(RequestMethod::Post);
    assert_eq!(worker.handle_fetch(&post), FetchOutcome::Passthrough);
    let cdn = Request::get("https://cdn.test/fonts/inter.woff2");
    assert_eq!(worker.handle_fetch(&cdn), FetchOutcome::Passthrough);

    app.go_offline();
    assert_eq!(app.fetch(&post), Err(NetworkError::Offline));
    assert_eq!(app.fetch(&cdn), Err(NetworkError::Offline));
}

#[test]
fn test_activation_keeps_only_current_generations() {
    let app = App::new();
    seed_generations(
        &app.caches,
        &[
            "offline-shell-precache-v1",
            "offline-shell-runtime-v1",
            "offline-shell-precache-v0-beta",
            "offline-shell-precache-v2",
            "offline-shell-runtime-v2",
        ],
    );

    let worker = app.spawn_worker(app.worker_config("v2")).unwrap();
    worker.install().unwrap();
    let report = worker.activate().unwrap();

    assert_eq!(report.deleted.len(), 3);
    assert_generations(
        &app.caches.read(),
        &["offline-shell-precache-v2", "offline-shell-runtime-v2"],
    )
    .unwrap();
}

#[test]
fn test_upgrade_replaces_previous_version() {
    let app = App::new();
    let v1 = app.deploy("v1").unwrap();
    app.fetch(&Request::get(MENU_JSON)).unwrap();
    assert_generations(
        &app.caches.read(),
        &["offline-shell-precache-v1", "offline-shell-runtime-v1"],
    )
    .unwrap();

    let v2 = app.deploy("v2").unwrap();
    assert_eq!(v1.state(), ServiceWorkerState::Redundant);
    assert_eq!(v2.state(), ServiceWorkerState::Activated);
    assert_eq!(app.container.read().len(), 1);
    assert_generations(&app.caches.read(), &["offline-shell-precache-v2"]).unwrap();

    app.go_offline();
    assert_serves_shell(&app.fetch(&Request::navigate("/orders"))).unwrap();
}

#[test]
fn test_update_waits_while_old_version_controls_a_page() {
    let app = App::new();
    let page = app.open_page("https://app.test/orders").unwrap();

    let mut config = app.worker_config("v1");
    config.skip_waiting = false;
    let v1 = app.deploy_with(config).unwrap();
    assert_eq!(v1.state(), ServiceWorkerState::Activated);
    assert!(app.clients.read().get(page.client).unwrap().controlled);

    let mut config = app.worker_config("v2");
    config.skip_waiting = false;
    let v2 = app.deploy_with(config).unwrap();
    assert!(v2.is_waiting());
    assert_eq!(v1.state(), ServiceWorkerState::Activated);
    assert!(Arc::ptr_eq(&app.controller("/orders").unwrap(), &v1));
    assert_generations(
        &app.caches.read(),
        &["offline-shell-precache-v1", "offline-shell-precache-v2"],
    )
    .unwrap();

    // last controlled page closes
    app.close(page).unwrap();
    let scope = Scope::new("/");
    assert!(app.container.write().promote_waiting(&scope).unwrap());
    assert_eq!(v2.state(), ServiceWorkerState::Activated);
    assert_eq!(v1.state(), ServiceWorkerState::Redundant);
    assert!(app.container.read().get_registration(&scope).unwrap().waiting().is_none());
    assert_generations(&app.caches.read(), &["offline-shell-precache-v2"]).unwrap();
}

#[test]
fn test_failed_install_keeps_running_version() {
    let app = App::new();
    let v1 = app.deploy("v1").unwrap();
    app.net.remove_route("/manifest-kitchen.json");

    let err = app.deploy("v2").unwrap_err();
    assert!(matches!(err, WorkerError::InstallFailed { ref url, .. } if url == "/manifest-kitchen.json"));

    assert_eq!(v1.state(), ServiceWorkerState::Activated);
    assert_generations(&app.caches.read(), &["offline-shell-precache-v1"]).unwrap();
    app.go_offline();
    assert_serves_shell(&app.fetch(&Request::navigate("/"))).unwrap();
}
