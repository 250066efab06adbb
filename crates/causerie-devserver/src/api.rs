use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use causerie_proto::constants::{AUTH_SCHEME_BEARER, AUTH_SCHEME_CLIENT_ID};
use causerie_proto::{
    ImageLink, ImageUploadRequest, ImageUploadResponse, MessageRecord, PublishRequest,
    PublishResponse, RoomId, TokenRequest, TokenResponse, UserId,
};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::images::ImageStore;
use crate::rooms::RoomRegistry;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomRegistry>,
    pub images: Arc<ImageStore>,
    pub config: Arc<ServerConfig>,
    /// Externally reachable base URL, used to build image links.
    pub base_url: String,
}

/// A running dev server bound to a concrete address.
pub struct DevServer {
    pub addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

impl DevServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_url(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn upload_url(&self) -> String {
        format!("http://{}/images/upload", self.addr)
    }

    /// Run until the server task ends.
    pub async fn wait(self) {
        let _ = self.task.await;
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Bind the configured address (port 0 picks a free one) and start serving.
pub async fn spawn(config: ServerConfig) -> anyhow::Result<DevServer> {
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    let addr = listener.local_addr()?;

    let state = AppState {
        rooms: Arc::new(RoomRegistry::new()),
        images: Arc::new(ImageStore::new(config.max_image_size)),
        base_url: format!("http://{addr}"),
        config: Arc::new(config),
    };
    let router = build_router(state);

    info!(addr = %addr, "Dev server listening");
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "Dev server failed");
        }
    });

    Ok(DevServer { addr, task })
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    // Base64 inflates uploads by 4/3; leave headroom over the decoded cap.
    let body_limit = state.config.max_image_size * 2;

    Router::new()
        .route("/health", get(health_check))
        .route("/token", post(issue_token))
        .route("/rooms/{room}/subscribe", get(room_subscribe))
        .route("/rooms/{room}/messages", post(room_publish))
        .route("/images/upload", post(image_upload))
        .route("/images/{id}", get(image_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    instance: String,
    version: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        instance: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn issue_token(
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ServerError> {
    if req.user_id.as_str().is_empty() {
        return Err(ServerError::BadRequest("user_id must not be empty".to_string()));
    }

    // Dev shortcut: the token embeds the user id so publishes can be
    // attributed without a session table.
    let token = format!("{}:{}", req.user_id, Uuid::new_v4());

    debug!(user = %req.user_id, "Issued token");
    Ok(Json(TokenResponse {
        access_token: token,
    }))
}

async fn room_subscribe(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Response, ServerError> {
    bearer_user(&headers)?;

    let room = RoomId(room);
    let rx = state.rooms.join(&room)?;
    info!(room = %room, "Subscriber attached");

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(record) => {
                    let line = match serde_json::to_string(&record) {
                        Ok(line) => line,
                        Err(e) => {
                            warn!(error = %e, "Dropping unserializable record");
                            continue;
                        }
                    };
                    return Some((Ok::<Bytes, Infallible>(Bytes::from(line + "\n")), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, records dropped");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(stream),
    )
        .into_response())
}

async fn room_publish(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(room): Path<String>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, ServerError> {
    let sender = bearer_user(&headers)?;

    if req.body.len() > state.config.max_body_size {
        return Err(ServerError::BodyTooLarge {
            size: req.body.len(),
            max: state.config.max_body_size,
        });
    }

    let room = RoomId(room);
    let record = MessageRecord {
        id: Uuid::new_v4(),
        room_id: room.clone(),
        sender_id: UserId(sender.clone()),
        sender_name: sender,
        body: req.body,
        created_at: Utc::now(),
    };
    let message_id = record.id;

    state.rooms.publish(&room, record)?;

    info!(room = %room, message_id = %message_id, "Message published");
    Ok(Json(PublishResponse { message_id }))
}

async fn image_upload(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(req): Json<ImageUploadRequest>,
) -> Result<Json<ImageUploadResponse>, ServerError> {
    require_client_id(&headers)?;

    let data = BASE64
        .decode(req.image.as_bytes())
        .map_err(|e| ServerError::BadRequest(format!("Invalid base64 image: {e}")))?;

    let size = data.len();
    let id = state.images.store(data)?;
    let link = format!("{}/images/{}", state.base_url, id);

    info!(id = %id, size, "Image uploaded via API");
    Ok(Json(ImageUploadResponse {
        data: ImageLink { link },
    }))
}

async fn image_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Vec<u8>, ServerError> {
    state.images.get(id)
}

/// Extract the user id from a `Bearer <user>:<nonce>` token (dev shortcut,
/// see `issue_token`).
fn bearer_user(headers: &HeaderMap) -> Result<String, ServerError> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth
        .strip_prefix(AUTH_SCHEME_BEARER)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| ServerError::Unauthorized("Missing bearer token".to_string()))?;

    match token.rsplit_once(':') {
        Some((user, _)) if !user.is_empty() => Ok(user.to_string()),
        _ => Err(ServerError::Unauthorized("Malformed token".to_string())),
    }
}

fn require_client_id(headers: &HeaderMap) -> Result<(), ServerError> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let key = auth
        .strip_prefix(AUTH_SCHEME_CLIENT_ID)
        .and_then(|rest| rest.strip_prefix(' '))
        .unwrap_or("");

    if key.is_empty() {
        return Err(ServerError::Unauthorized(
            "Missing Client-ID credential".to_string(),
        ));
    }
    Ok(())
}
