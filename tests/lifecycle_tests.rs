// Cache lifecycle tests - install, activate, fetch interception, notifications
// Author: kelexine (https://github.com/kelexine)

mod common;

use common::{agent_config, harness, url, StubNetwork};
use offline_agent::agent::{AgentEvent, EventOutcome, LifecycleState, ResponseSource};
use offline_agent::cache::CacheStorage;
use offline_agent::error::AgentError;
use offline_agent::models::{AgentRequest, AgentResponse, Destination, RequestKey};
use proptest::prelude::*;
use std::sync::atomic::Ordering;
use std::time::Duration;
use uuid::Uuid;

fn site() -> StubNetwork {
    StubNetwork::new()
        .route("/", AgentResponse::basic(200, "<html>root</html>"))
        .route(
            "/index.html",
            AgentResponse::basic(200, "<html>shell</html>").with_header("content-type", "text/html"),
        )
        .route("/manifest.json", AgentResponse::basic(200, "{}"))
}

#[tokio::test]
async fn test_precached_resources_return_200_after_install() {
    let precache = ["/", "/index.html", "/manifest.json"];
    let h = harness(agent_config("v1", &precache), site());

    let outcome = h.agent.handle_event(AgentEvent::Install).await.unwrap();
    let EventOutcome::Installed(report) = outcome else {
        panic!("expected install report");
    };
    assert!(report.is_complete());

    for path in precache {
        let hit = h
            .storage
            .match_in("v1", &RequestKey::get(&url(path)))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("{} not precached", path));
        assert_eq!(hit.status, 200);
    }
}

#[tokio::test]
async fn test_failed_precache_entry_falls_through_to_network() {
    // "/a" is unreachable during install and stays that way
    let h = harness(agent_config("v1", &["/a", "/index.html"]), site());

    let report = h.agent.install().await.unwrap();
    assert_eq!(h.agent.state(), LifecycleState::Installed);
    assert!(report.cached.is_empty());
    assert_eq!(report.failed[0].identifier, "/a");
    // One failure means nothing from this install is stored
    assert!(h
        .storage
        .match_in("v1", &RequestKey::get(&url("/index.html")))
        .await
        .unwrap()
        .is_none());

    h.agent.activate().await.unwrap();
    let calls_before = h.network.calls();

    let err = h.agent.fetch(AgentRequest::get(url("/a"))).await.unwrap_err();
    assert!(matches!(err, AgentError::Network(_)));
    assert_eq!(h.network.calls(), calls_before + 1, "miss must go to the network");
}

#[tokio::test]
async fn test_activate_leaves_only_current_version() {
    let h = harness(agent_config("v3", &["/index.html"]), site());
    for old in ["v1", "v2"] {
        h.storage
            .put(old, RequestKey::get(&url("/index.html")), AgentResponse::basic(200, old))
            .await
            .unwrap();
    }

    h.agent.install().await.unwrap();
    let report = h.agent.activate().await.unwrap();

    assert_eq!(report.deleted, vec!["v1", "v2"]);
    assert_eq!(h.storage.keys().await.unwrap(), vec!["v3"]);
    assert_eq!(h.agent.state(), LifecycleState::Activated);
}

#[tokio::test]
async fn test_activate_continues_when_deletion_fails() {
    let h = harness(agent_config("v2", &[]), site());
    h.storage.open("v1").await.unwrap();
    h.storage.fail_delete.store(true, Ordering::SeqCst);

    h.agent.install().await.unwrap();
    let report = h.agent.activate().await.unwrap();

    assert!(report.deleted.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "v1");
    assert_eq!(h.agent.state(), LifecycleState::Activated);
}

#[tokio::test]
async fn test_reinstall_after_activation_then_activate_again() {
    let h = harness(agent_config("v1", &["/index.html"]), site());
    h.agent.install().await.unwrap();
    h.agent.activate().await.unwrap();

    // Re-delivered activate re-runs eviction
    h.storage.open("stray").await.unwrap();
    let report = h.agent.activate().await.unwrap();
    assert_eq!(report.deleted, vec!["stray"]);

    h.agent.install().await.unwrap();
    assert_eq!(h.agent.state(), LifecycleState::Installed);
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let h = harness(agent_config("v1", &["/index.html"]), site());
    h.agent.install().await.unwrap();
    h.agent.activate().await.unwrap();
    let calls_before = h.network.calls();

    let fetched = h.agent.fetch(AgentRequest::get(url("/index.html"))).await.unwrap();
    assert_eq!(fetched.source, ResponseSource::Cache);
    assert_eq!(&fetched.response.body[..], b"<html>shell</html>");
    assert_eq!(h.network.calls(), calls_before);
}

#[tokio::test]
async fn test_network_200_basic_written_exactly_once() {
    let h = harness(
        agent_config("v1", &[]),
        StubNetwork::new().route("/app.js", AgentResponse::basic(200, "console.log(1)")),
    );

    let fetched = h.agent.fetch(AgentRequest::get(url("/app.js"))).await.unwrap();
    fetched.cache_write.expect("write scheduled").await.unwrap();

    assert_eq!(h.storage.puts.load(Ordering::SeqCst), 1);
    let cached = h.storage.match_in("v1", &RequestKey::get(&url("/app.js"))).await.unwrap();
    assert_eq!(cached, Some(fetched.response));
}

#[tokio::test]
async fn test_non_cacheable_responses_are_not_written() {
    let h = harness(
        agent_config("v1", &[]),
        StubNetwork::new()
            .route("/missing", AgentResponse::basic(404, ""))
            .route("/error", AgentResponse::basic(500, ""))
            .route("/redirect", AgentResponse::basic(302, "").with_header("location", "/"))
            .route("/opaque", AgentResponse::opaque()),
    );

    for path in ["/missing", "/error", "/redirect", "/opaque"] {
        let fetched = h.agent.fetch(AgentRequest::get(url(path))).await.unwrap();
        assert_eq!(fetched.source, ResponseSource::Network);
        assert!(fetched.cache_write.is_none());
    }
    assert_eq!(h.storage.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cache_write_failure_does_not_affect_response() {
    let h = harness(
        agent_config("v1", &[]),
        StubNetwork::new().route("/app.css", AgentResponse::basic(200, "body{}")),
    );
    h.storage.fail_put.store(true, Ordering::SeqCst);

    let fetched = h.agent.fetch(AgentRequest::get(url("/app.css"))).await.unwrap();
    assert_eq!(&fetched.response.body[..], b"body{}");
    // The detached task swallows the failure instead of panicking
    fetched.cache_write.unwrap().await.unwrap();
    assert!(h.storage.match_request(&RequestKey::get(&url("/app.css"))).await.unwrap().is_none());
}

#[tokio::test]
async fn test_post_is_never_served_from_cache() {
    let h = harness(
        agent_config("v1", &[]),
        StubNetwork::new().route("/api/vote", AgentResponse::basic(200, "ok")),
    );

    let post = AgentRequest::get(url("/api/vote")).with_method("POST").with_body("team=1");
    let fetched = h.agent.fetch(post.clone()).await.unwrap();
    assert!(fetched.cache_write.is_none(), "no write is scheduled for POST");

    let again = h.agent.fetch(post).await.unwrap();
    assert_eq!(again.source, ResponseSource::Network);
    assert!(again.cache_write.is_none());
    assert_eq!(h.network.calls(), 2);
    assert_eq!(h.storage.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_offline_navigation_gets_fallback_page() {
    let h = harness(agent_config("v1", &["/index.html"]), site());
    h.agent.install().await.unwrap();
    h.agent.activate().await.unwrap();
    h.network.set_offline(true);

    let fetched = h.agent.fetch(AgentRequest::navigate(url("/schedule"))).await.unwrap();
    assert_eq!(fetched.source, ResponseSource::OfflineFallback);
    assert_eq!(&fetched.response.body[..], b"<html>shell</html>");
}

#[tokio::test]
async fn test_offline_navigation_without_fallback_fails_explicitly() {
    let h = harness(agent_config("v1", &[]), site());
    h.network.set_offline(true);

    let err = h.agent.fetch(AgentRequest::navigate(url("/schedule"))).await.unwrap_err();
    assert!(matches!(err, AgentError::OfflineUnavailable(_)));
}

#[tokio::test]
async fn test_offline_image_gets_no_fallback() {
    let h = harness(agent_config("v1", &["/index.html"]), site());
    h.agent.install().await.unwrap();
    h.network.set_offline(true);

    let req = AgentRequest::get(url("/photo.jpg")).with_destination(Destination::Image);
    let err = h.agent.fetch(req).await.unwrap_err();
    assert!(matches!(err, AgentError::Network(_)));
}

#[tokio::test]
async fn test_offline_iframe_gets_no_fallback() {
    let h = harness(agent_config("v1", &["/index.html"]), site());
    h.agent.install().await.unwrap();
    h.network.set_offline(true);

    let req = AgentRequest::get(url("/embed/widget")).with_destination(Destination::Iframe);
    let err = h.agent.fetch(req).await.unwrap_err();
    assert!(matches!(err, AgentError::Network(_)));
}

#[tokio::test]
async fn test_concurrent_misses_both_write_without_error() {
    let h = harness(
        agent_config("v1", &[]),
        StubNetwork::new()
            .with_delay(Duration::from_millis(20))
            .route("/data.json", AgentResponse::basic(200, "[1,2,3]")),
    );

    let (a, b) = tokio::join!(
        h.agent.fetch(AgentRequest::get(url("/data.json"))),
        h.agent.fetch(AgentRequest::get(url("/data.json"))),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.source, ResponseSource::Network);
    assert_eq!(b.source, ResponseSource::Network);
    a.cache_write.unwrap().await.unwrap();
    b.cache_write.unwrap().await.unwrap();

    let cached = h
        .storage
        .match_in("v1", &RequestKey::get(&url("/data.json")))
        .await
        .unwrap()
        .unwrap();
    assert!(cached == a.response || cached == b.response);
    assert_eq!(h.storage.summaries().await.unwrap()[0].entries, 1);
}

#[tokio::test]
async fn test_sync_is_a_logged_stub() {
    let h = harness(agent_config("v1", &[]), site());

    let handled = h
        .agent
        .handle_event(AgentEvent::Sync { tag: "background-sync".to_string() })
        .await
        .unwrap();
    assert!(matches!(handled, EventOutcome::Synced { handled: true }));

    let ignored = h
        .agent
        .handle_event(AgentEvent::Sync { tag: "periodic".to_string() })
        .await
        .unwrap();
    assert!(matches!(ignored, EventOutcome::Synced { handled: false }));
    assert_eq!(h.network.calls(), 0);
}

#[tokio::test]
async fn test_push_displays_notification() {
    let h = harness(agent_config("v1", &[]), site());

    let outcome = h
        .agent
        .handle_event(AgentEvent::Push { data: Some("First pitch at 8:00".to_string()) })
        .await
        .unwrap();
    let EventOutcome::NotificationShown(id) = outcome else {
        panic!("expected notification");
    };

    let shown = h.notifier.shown.lock();
    assert_eq!(shown.len(), 1);
    let (shown_id, title, options) = &shown[0];
    assert_eq!(*shown_id, id);
    assert_eq!(title, "Offline App");
    assert_eq!(options.body, "First pitch at 8:00");
    assert_eq!(options.actions.len(), 2);
    assert_eq!(options.actions[0].action, "explore");
    assert_eq!(options.actions[1].action, "close");
}

#[tokio::test]
async fn test_push_without_payload_uses_default_message() {
    let h = harness(agent_config("v1", &[]), site());
    h.agent.push(None).unwrap();

    let shown = h.notifier.shown.lock();
    assert_eq!(shown[0].2.body, "You have a new update from the app");
}

#[tokio::test]
async fn test_notification_click_actions() {
    let h = harness(agent_config("v1", &[]), site());
    let id = Uuid::new_v4();

    let explore = h
        .agent
        .handle_event(AgentEvent::NotificationClick { id, action: Some("explore".to_string()) })
        .await
        .unwrap();
    assert!(matches!(
        explore,
        EventOutcome::NotificationClicked { opened: Some(ref u) } if u == "https://app.example.com/"
    ));

    h.agent.notification_click(id, Some("close")).unwrap();
    h.agent.notification_click(id, None).unwrap();

    assert_eq!(h.windows.opened.lock().len(), 1);
    assert_eq!(h.notifier.closed.lock().len(), 3);
}

proptest! {
    #[test]
    fn prop_cache_hit_is_byte_identical(
        body in proptest::collection::vec(any::<u8>(), 0..512),
        segment in "[a-z0-9]{1,16}",
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let path = format!("/assets/{}", segment);
            let original = AgentResponse::basic(200, body.clone())
                .with_header("content-type", "application/octet-stream");
            let h = harness(
                agent_config("v1", &[]),
                StubNetwork::new().route(&path, original.clone()),
            );

            let first = h.agent.fetch(AgentRequest::get(url(&path))).await.unwrap();
            first.cache_write.unwrap().await.unwrap();
            h.network.set_offline(true);

            let hit = h.agent.fetch(AgentRequest::get(url(&path))).await.unwrap();
            prop_assert_eq!(hit.source, ResponseSource::Cache);
            prop_assert_eq!(&hit.response, &original);
            prop_assert_eq!(&hit.response.body[..], &body[..]);
            Ok(())
        })?;
    }
}
