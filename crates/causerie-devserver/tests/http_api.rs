//! HTTP API surface of the dev server, exercised with a real client.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::StreamExt;
use reqwest::StatusCode;

use causerie_devserver::{spawn, DevServer, ServerConfig};
use causerie_proto::{
    ImageUploadRequest, ImageUploadResponse, MessageRecord, PublishRequest, PublishResponse,
    TokenRequest, TokenResponse,
};

async fn dev_server() -> DevServer {
    spawn(ServerConfig::ephemeral()).await.unwrap()
}

async fn token_for(server: &DevServer, user: &str) -> String {
    let response: TokenResponse = reqwest::Client::new()
        .post(server.token_url())
        .json(&TokenRequest {
            user_id: user.into(),
        })
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    response.access_token
}

#[tokio::test]
async fn test_health() {
    let server = dev_server().await;
    let response = reqwest::get(format!("{}/health", server.base_url()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_rejects_empty_user() {
    let server = dev_server().await;
    let response = reqwest::Client::new()
        .post(server.token_url())
        .json(&TokenRequest { user_id: "".into() })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_subscribe_and_publish_require_auth() {
    let server = dev_server().await;
    let http = reqwest::Client::new();

    let subscribe = http
        .get(format!("{}/rooms/r/subscribe", server.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(subscribe.status(), StatusCode::UNAUTHORIZED);

    let publish = http
        .post(format!("{}/rooms/r/messages", server.base_url()))
        .json(&PublishRequest {
            body: "x".to_string(),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(publish.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_publish_is_delivered_to_subscriber() {
    let server = dev_server().await;
    let http = reqwest::Client::new();
    let token = token_for(&server, "alice").await;

    let subscription = http
        .get(format!("{}/rooms/lobby/subscribe", server.base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let published: PublishResponse = http
        .post(format!("{}/rooms/lobby/messages", server.base_url()))
        .bearer_auth(&token)
        .json(&PublishRequest {
            body: "first!".to_string(),
        })
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Read the subscription stream until the first full NDJSON line.
    let mut stream = subscription.bytes_stream();
    let mut buf = Vec::new();
    let line = loop {
        let chunk = tokio::time::timeout(std::time::Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for record")
            .expect("stream ended")
            .unwrap();
        buf.extend_from_slice(&chunk);
        if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            break String::from_utf8(buf[..pos].to_vec()).unwrap();
        }
    };

    let record: MessageRecord = serde_json::from_str(&line).unwrap();
    assert_eq!(record.id, published.message_id);
    assert_eq!(record.sender_id.as_str(), "alice");
    assert_eq!(record.body, "first!");
}

#[tokio::test]
async fn test_image_upload_roundtrip() {
    let server = dev_server().await;
    let http = reqwest::Client::new();
    let bytes = b"not-really-a-png".to_vec();

    let uploaded: ImageUploadResponse = http
        .post(server.upload_url())
        .header("Authorization", "Client-ID devkey")
        .json(&ImageUploadRequest {
            image: BASE64.encode(&bytes),
        })
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let downloaded = http
        .get(&uploaded.data.link)
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(downloaded.as_ref(), bytes.as_slice());
}

#[tokio::test]
async fn test_image_upload_requires_client_id() {
    let server = dev_server().await;
    let response = reqwest::Client::new()
        .post(server.upload_url())
        .json(&ImageUploadRequest {
            image: BASE64.encode(b"x"),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oversize_image_rejected() {
    let config = ServerConfig {
        max_image_size: 16,
        ..ServerConfig::ephemeral()
    };
    let server = spawn(config).await.unwrap();

    let response = reqwest::Client::new()
        .post(server.upload_url())
        .header("Authorization", "Client-ID devkey")
        .json(&ImageUploadRequest {
            image: BASE64.encode(vec![0u8; 64]),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
