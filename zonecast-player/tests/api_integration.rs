//! HTTP API integration tests
//!
//! Drive the router in-process with `tower::ServiceExt::oneshot` against a
//! controller wired to recording fakes.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use helpers::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use zonecast_player::api::{build_router, AppContext};
use zonecast_player::services::Catalog;

fn router(h: &Harness, catalog: Option<Arc<dyn Catalog>>) -> Router {
    build_router(AppContext {
        state: h.state.clone(),
        controller: h.controller.clone(),
        catalog,
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new(settings(300, 3.0));
    let app = router(&h, None);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "zonecast_player");
}

#[tokio::test]
async fn test_start_without_selection_is_unprocessable() {
    let h = Harness::new(settings(300, 3.0));
    let app = router(&h, None);

    let (status, body) = send(&app, "POST", "/playback/start", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Please select at least one music track");
}

#[tokio::test]
async fn test_configure_start_and_stop() {
    let h = Harness::new(settings(300, 3.0));
    let app = router(&h, None);

    let library = json!({
        "tracks": [
            {"id": "m1", "name": "Morning", "url": "https://cdn.example.com/m1.mp3", "duration": 200.0},
            {"id": "m2", "name": "Noon", "url": "https://cdn.example.com/m2.mp3", "duration": 180.0}
        ],
        "announcements": [
            {"id": "a1", "title": "Store closing", "url": "https://cdn.example.com/a1.mp3",
             "duration": 12.0, "enabled": true}
        ],
        "zones": [{"id": "z1", "name": "Ground Floor"}]
    });
    let (status, body) = send(&app, "PUT", "/library", Some(library)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracks"], 2);
    assert_eq!(body["announcements"], 1);

    let (status, body) = send(
        &app,
        "PUT",
        "/playback/selection",
        Some(json!({"selectedMusicIds": ["m2", "m1"], "selectedAnnouncementIds": ["a1"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["music_count"], 2);
    assert_eq!(body["current_music"]["id"], "m2");

    let (status, _) = send(&app, "PUT", "/playback/zone", Some(json!({"zone_id": "nowhere"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, "PUT", "/playback/zone", Some(json!({"zoneId": "z1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zone_id"], "z1");

    let (status, body) = send(&app, "POST", "/playback/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_running"], false);
    assert_eq!(body["view"]["phase"], "playing");
    assert_eq!(body["view"]["time_until_next_announcement"], 300);
    assert_eq!(body["view"]["time_until_next_display"], "5:00");
    assert_eq!(h.local.played(), ids(&["m2"]));

    let (status, body) = send(&app, "POST", "/playback/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_running"], true);

    let (status, body) = send(&app, "GET", "/playback/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_playing"], true);

    let (status, body) = send(&app, "POST", "/playback/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "stopped");
    assert_eq!(body["time_until_next_announcement"], 0);
}

#[tokio::test]
async fn test_skip_reports_whether_sequence_started() {
    let h = Harness::configured(settings(300, 3.0), &["m1"], vec![playable("x1")]).await;
    let app = router(&h, None);

    let (status, body) = send(&app, "POST", "/playback/announcement/skip", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], false);

    send(&app, "POST", "/playback/start", None).await;
    let (status, body) = send(&app, "POST", "/playback/announcement/skip", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], true);
    assert_eq!(body["view"]["phase"], "ducking");
    assert_eq!(body["view"]["is_playing_announcement"], true);

    h.controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_settings_are_clamped() {
    let h = Harness::new(settings(300, 3.0));
    let app = router(&h, None);

    let (status, body) = send(
        &app,
        "PUT",
        "/playback/settings",
        Some(json!({
            "announcement_interval_seconds": 2,
            "fade_duration_seconds": 60.0,
            "announcement_volume_percent": 150
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["announcement_interval_seconds"], 10);
    assert_eq!(body["fade_duration_seconds"], 10.0);
    assert_eq!(body["announcement_volume_percent"], 100);
    assert_eq!(body["background_volume_percent"], 20);

    let (status, body) = send(&app, "GET", "/playback/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["announcement_interval_seconds"], 10);
}

#[tokio::test]
async fn test_remote_state_push_drives_toggle() {
    let h = Harness::new(settings(300, 3.0));
    let app = router(&h, None);
    h.controller.set_zone(Some(ZONE.to_string())).await.unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/remote/state",
        Some(json!({"state": "live", "now_playing": {"is_playing": true, "title": "Morning"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(h.state.remote_state().is_playing());

    // Give the controller a chance to observe the push
    let mut view_rx = h.controller.subscribe_view();
    if !view_rx.borrow().is_playing {
        view_rx.changed().await.unwrap();
    }

    let (status, body) = send(&app, "POST", "/playback/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playing"], false);
    assert_eq!(h.remote.calls(), vec![RemoteCall::Pause(ZONE.to_string())]);
}

#[tokio::test]
async fn test_toggle_backend_failure_is_bad_gateway() {
    let h = Harness::new(settings(300, 3.0));
    let app = router(&h, None);
    h.controller.set_zone(Some(ZONE.to_string())).await.unwrap();
    h.remote.set_failing(true);

    let (status, body) = send(&app, "POST", "/playback/toggle", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_library_refresh() {
    let h = Harness::new(settings(300, 3.0));

    let (status, _) = send(&router(&h, None), "POST", "/library/refresh", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let catalog: Arc<dyn Catalog> = Arc::new(FakeCatalog {
        library: library(&["m1", "m2", "m3"], vec![playable("x1")]),
    });
    let app = router(&h, Some(catalog));
    let (status, body) = send(&app, "POST", "/library/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracks"], 3);
    assert_eq!(body["announcements"], 1);
    assert_eq!(body["zones"], 1);

    h.controller
        .set_selection(ids(&["m3"]), Vec::new())
        .await
        .unwrap();
    assert_eq!(h.controller.view().current_music.unwrap().id, "m3");
}
