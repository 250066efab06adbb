//! Upload-queue behavior: strict FIFO, at most one in-flight upload, and
//! best-effort continuation past failures.
//!
//! The chat side runs against the in-process dev server; the image host is
//! replaced by a probe that records upload concurrency and can fail chosen
//! attempts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use tokio::time::timeout;

use causerie_channel::ChannelConfig;
use causerie_client::{
    activate, ImageData, ImageHostConfig, LocationError, LocationFix, LocationPolicy,
    LocationProvider, ScreenConfig, ScreenEvent,
};
use causerie_devserver::{spawn, DevServer, ServerConfig};
use causerie_proto::DisplayBody;

const WAIT: Duration = Duration::from_secs(5);

struct NoFix;

#[async_trait]
impl LocationProvider for NoFix {
    async fn current_position(
        &self,
        _policy: &LocationPolicy,
    ) -> Result<LocationFix, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

#[derive(Clone, Default)]
struct Probe {
    current: Arc<AtomicUsize>,
    max_concurrent: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
    fail_attempts: Arc<Vec<usize>>,
}

async fn upload_probe(
    State(probe): State<Probe>,
    Json(_req): Json<serde_json::Value>,
) -> axum::response::Response {
    let now = probe.current.fetch_add(1, Ordering::SeqCst) + 1;
    probe.max_concurrent.fetch_max(now, Ordering::SeqCst);
    let attempt = probe.attempts.fetch_add(1, Ordering::SeqCst) + 1;

    // Hold the request open long enough for any overlap to register.
    tokio::time::sleep(Duration::from_millis(30)).await;
    probe.current.fetch_sub(1, Ordering::SeqCst);

    if probe.fail_attempts.contains(&attempt) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(serde_json::json!({
        "data": { "link": format!("http://img.test/{attempt}.png") }
    }))
    .into_response()
}

/// Spawn the image-host probe; returns its upload URL and the counters.
async fn spawn_probe(fail_attempts: Vec<usize>) -> (String, Probe) {
    let probe = Probe {
        fail_attempts: Arc::new(fail_attempts),
        ..Default::default()
    };
    let router = Router::new()
        .route("/upload", post(upload_probe))
        .with_state(probe.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}/upload"), probe)
}

async fn screen_with_probe(
    server: &DevServer,
    room: &str,
    upload_url: String,
) -> (
    causerie_client::ScreenHandle,
    tokio::sync::mpsc::Receiver<ScreenEvent>,
) {
    let config = ScreenConfig {
        channel: ChannelConfig {
            service_url: server.base_url(),
            token_url: server.token_url(),
        },
        image_host: ImageHostConfig {
            upload_url,
            api_key: "devkey".to_string(),
        },
        user_id: "marie".into(),
        room: room.into(),
        location_policy: LocationPolicy::default(),
    };
    activate(config, Arc::new(NoFix)).await.unwrap()
}

async fn next_message(rx: &mut tokio::sync::mpsc::Receiver<ScreenEvent>) -> DisplayBody {
    let event = timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for screen event")
        .expect("event stream closed");
    match event {
        ScreenEvent::MessageAppended(msg) => msg.body,
        other => panic!("Expected MessageAppended, got {other:?}"),
    }
}

#[tokio::test]
async fn test_uploads_are_sequential_and_fifo() {
    let server = spawn(ServerConfig::ephemeral()).await.unwrap();
    let (upload_url, probe) = spawn_probe(Vec::new()).await;
    let (handle, mut events) = screen_with_probe(&server, "pics", upload_url).await;

    // Four images picked back-to-back while the first is still uploading.
    for i in 0..4u8 {
        handle
            .attach_image(ImageData::new(vec![i; 16]))
            .await
            .unwrap();
    }

    let mut links = Vec::new();
    while links.len() < 4 {
        match next_message(&mut events).await {
            DisplayBody::Image { url } => links.push(url),
            other => panic!("Expected image message, got {other:?}"),
        }
    }

    assert_eq!(
        links,
        vec![
            "http://img.test/1.png",
            "http://img.test/2.png",
            "http://img.test/3.png",
            "http://img.test/4.png",
        ]
    );
    assert_eq!(probe.attempts.load(Ordering::SeqCst), 4);
    assert_eq!(
        probe.max_concurrent.load(Ordering::SeqCst),
        1,
        "more than one upload was in flight"
    );
}

#[tokio::test]
async fn test_failed_upload_is_dropped_and_queue_continues() {
    let server = spawn(ServerConfig::ephemeral()).await.unwrap();
    let (upload_url, probe) = spawn_probe(vec![1]).await;
    let (handle, mut events) = screen_with_probe(&server, "pics-fail", upload_url).await;

    handle.attach_image(ImageData::new(vec![1; 16])).await.unwrap();
    handle.attach_image(ImageData::new(vec![2; 16])).await.unwrap();

    // The first upload fails silently; only the second produces a message.
    assert_eq!(
        next_message(&mut events).await,
        DisplayBody::Image {
            url: "http://img.test/2.png".to_string()
        }
    );

    // A marker sent afterwards arrives next: no stray image message for
    // the failed attempt is in flight behind it.
    handle.send_text("marker").await.unwrap();
    assert_eq!(
        next_message(&mut events).await,
        DisplayBody::Text("marker".to_string())
    );

    assert_eq!(probe.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sole_failing_upload_does_not_wedge_the_screen() {
    let server = spawn(ServerConfig::ephemeral()).await.unwrap();
    let (upload_url, probe) = spawn_probe(vec![1]).await;
    let (handle, mut events) = screen_with_probe(&server, "pics-solo", upload_url).await;

    handle.attach_image(ImageData::new(vec![9; 16])).await.unwrap();
    handle.send_text("still alive").await.unwrap();

    assert_eq!(
        next_message(&mut events).await,
        DisplayBody::Text("still alive".to_string())
    );

    // Wait out the (failing) upload attempt before checking the counters.
    for _ in 0..100 {
        if probe.attempts.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(probe.attempts.load(Ordering::SeqCst), 1);

    let messages = handle.snapshot().await.unwrap();
    assert_eq!(messages.len(), 1, "failed upload must produce no message");
}
