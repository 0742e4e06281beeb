//! Router tests: static assets, health, stats, and the WebSocket route

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use birdsong_api::{create_router, AppState};
use birdsong_core::config::ServerConfig;
use birdsong_core::models::TweetEvent;
use birdsong_relay::{BroadcastRelay, RelayLimits};
use http_body_util::BodyExt;
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    relay: BroadcastRelay,
    _assets: TempDir,
}

fn test_app() -> TestApp {
    let assets = tempfile::tempdir().unwrap();
    let root = assets.path();

    fs::write(root.join("index.html"), "<html>birdsong</html>").unwrap();
    fs::create_dir(root.join("src")).unwrap();
    fs::write(root.join("src").join("visual.js"), "console.log('tweet');").unwrap();
    fs::create_dir(root.join("mp3")).unwrap();
    fs::write(root.join("mp3").join("bird.mp3"), [0xffu8, 0xfb, 0x90, 0x00]).unwrap();

    let server = ServerConfig {
        static_dir: root.join("src").to_string_lossy().into_owned(),
        audio_dir: root.join("mp3").to_string_lossy().into_owned(),
        index_file: root.join("index.html").to_string_lossy().into_owned(),
        ..ServerConfig::default()
    };

    let relay = BroadcastRelay::new(RelayLimits::default());
    let router = create_router(AppState::new(relay.clone(), server));

    TestApp {
        router,
        relay,
        _assets: assets,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_index_page() {
    let app = test_app();

    let (status, body) = get(&app.router, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<html>birdsong</html>");
}

#[tokio::test]
async fn test_static_and_audio_assets() {
    let app = test_app();

    let (status, body) = get(&app.router, "/src/visual.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"console.log('tweet');");

    let (status, body) = get(&app.router, "/audio/bird.mp3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, [0xff, 0xfb, 0x90, 0x00]);

    let (status, _) = get(&app.router, "/audio/missing.mp3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let app = test_app();

    let (status, body) = get(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_stats_reflect_relay() {
    let app = test_app();
    let _viewer = app.relay.register().unwrap();
    app.relay
        .publish(TweetEvent::new("alice", "a bird flew by"))
        .unwrap();

    let (status, body) = get(&app.router, "/stats").await;
    assert_eq!(status, StatusCode::OK);

    let stats: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats["live_sessions"], 1);
    assert_eq!(stats["events_published"], 1);
    assert_eq!(stats["frames_delivered"], 1);
    assert_eq!(stats["frames_dropped"], 0);
}

#[tokio::test]
async fn test_ws_requires_upgrade() {
    let app = test_app();

    let (status, _) = get(&app.router, "/ws").await;

    assert!(status.is_client_error());
    assert_eq!(app.relay.session_count(), 0);
}

#[tokio::test]
async fn test_cors_headers() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
