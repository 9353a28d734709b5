//! Push notifications and clicks

use shell_worker::{ClickOutcome, EventOutcome, WorkerError, WorkerEvent};

use crate::fixtures::App;

const ORDER_READY: &str =
    r#"{"title":"Order ready","body":"Table 4 is ready to serve","tag":"order-4","data":{"url":"/orders/4"}}"#;

#[test]
fn test_click_focuses_open_window() {
    let app = App::new();
    let worker = app.deploy("v1").unwrap();
    let _feed = app.open_page("https://app.test/feed").unwrap();
    let _order = app.open_page("https://app.test/orders/4").unwrap();

    let shown = worker.handle_push(Some(ORDER_READY.as_bytes()));
    assert_eq!(shown.title, "Order ready");
    assert_eq!(shown.target_url, "/orders/4");
    assert_eq!(shown.icon, "/icons/icon-192.png");

    match worker.handle_notification_click(shown.id).unwrap() {
        ClickOutcome::Focused(client) => {
            assert_eq!(client.url, "https://app.test/orders/4");
            assert!(client.focused);
        }
        other => panic!("expected focus, got {:?}", other),
    }
    assert!(worker.notifications().is_empty());
    assert_eq!(app.clients.read().match_all().len(), 2);
}

#[test]
fn test_click_opens_window_when_none_matches() {
    let app = App::new();
    let worker = app.deploy("v1").unwrap();
    let _feed = app.open_page("https://app.test/feed").unwrap();

    let shown = worker.handle_push(Some(ORDER_READY.as_bytes()));
    match worker.handle_notification_click(shown.id).unwrap() {
        ClickOutcome::Opened(client) => {
            assert_eq!(client.url, "/orders/4");
            assert!(client.controlled);
        }
        other => panic!("expected a new window, got {:?}", other),
    }
    assert_eq!(app.clients.read().match_all().len(), 2);

    // already closed
    assert!(matches!(
        worker.handle_notification_click(shown.id),
        Err(WorkerError::NotificationNotFound(id)) if id == shown.id
    ));
}

#[test]
fn test_pushes_through_dispatch() {
    let app = App::new();
    let worker = app.deploy("v1").unwrap();

    let first = match worker.dispatch(WorkerEvent::Push(Some(ORDER_READY.as_bytes().to_vec()))) {
        Ok(EventOutcome::Notified(n)) => n,
        other => panic!("unexpected {:?}", other),
    };
    let update = r#"{"title":"Order ready","body":"Table 4, second round","tag":"order-4"}"#;
    let second = match worker.dispatch(WorkerEvent::Push(Some(update.as_bytes().to_vec()))) {
        Ok(EventOutcome::Notified(n)) => n,
        other => panic!("unexpected {:?}", other),
    };
    assert_ne!(first.id, second.id);

    // garbage payload still shows something
    let fallback = match worker.dispatch(WorkerEvent::Push(Some(b"\xff\x00".to_vec()))) {
        Ok(EventOutcome::Notified(n)) => n,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(fallback.title, "New notification");
    assert_eq!(fallback.target_url, "/");

    let shown = worker.notifications();
    assert_eq!(shown.len(), 2);
    assert!(shown.iter().any(|n| n.body == "Table 4, second round"));
}
