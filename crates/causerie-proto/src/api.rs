//! Request/response shapes of the two hosted HTTP APIs (chat backend and
//! image host), shared by the channel client and the dev server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{RoomId, UserId};

/// A delivered message as the transport hands it over.
///
/// Everything here except `body` is owned by the transport; the body is an
/// opaque string that only the envelope codec interprets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// `POST {token_url}` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub user_id: UserId,
}

/// `POST {token_url}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// `POST /rooms/{room}/messages` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub body: String,
}

/// `POST /rooms/{room}/messages` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    pub message_id: Uuid,
}

/// `POST /images/upload` request: image bytes, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadRequest {
    pub image: String,
}

/// `POST /images/upload` response. The extra nesting is the image host's
/// response shape, kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub data: ImageLink,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLink {
    pub link: String,
}
