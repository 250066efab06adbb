//! Channel session with the tokio mpsc command/notification pattern.
//!
//! One background task owns the connection to the chat backend. The
//! application sends typed commands in and receives typed notifications
//! out, mirroring the callback hooks of the hosted SDK it replaces.

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use causerie_proto::{MessageRecord, PublishRequest, PublishResponse, RoomId, UserId};

use crate::error::ChannelError;
use crate::stream::LineFramer;
use crate::token::TokenProvider;

// ---------------------------------------------------------------------------
// Command / notification types
// ---------------------------------------------------------------------------

/// Commands sent *into* the channel task.
#[derive(Debug)]
pub enum ChannelCommand {
    /// Publish an opaque body on the subscribed room. Fire-and-forget:
    /// delivery failures are logged inside the task, never retried.
    Publish { room: RoomId, body: String },
    /// Gracefully shut down the channel task.
    Shutdown,
}

/// Notifications sent *from* the channel task to the application.
#[derive(Debug, Clone)]
pub enum ChannelNotification {
    /// The room subscription is live.
    Subscribed { room: RoomId },
    /// A message arrived on the subscribed room.
    MessageReceived { record: MessageRecord },
    /// The subscription ended; the task is gone. There is no automatic
    /// reconnect — the embedder decides whether to connect again.
    Disconnected { reason: String },
}

/// Where the hosted backend lives.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Base URL of the chat backend, e.g. `http://127.0.0.1:8080`.
    pub service_url: String,
    /// Token-provider endpoint, e.g. `http://127.0.0.1:8080/token`.
    pub token_url: String,
}

/// Capacity of the command and notification channels.
const CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Connect
// ---------------------------------------------------------------------------

/// Authenticate, subscribe to exactly one room, and spawn the driver task.
///
/// Returns the command sender and notification receiver. Token or
/// subscription failures are returned to the caller; nothing is retried.
pub async fn connect(
    config: ChannelConfig,
    user_id: UserId,
    room: RoomId,
) -> Result<
    (
        mpsc::Sender<ChannelCommand>,
        mpsc::Receiver<ChannelNotification>,
    ),
    ChannelError,
> {
    let http = reqwest::Client::new();

    let token = TokenProvider::new(config.token_url.clone(), http.clone())
        .fetch(&user_id)
        .await?;

    let subscribe_url = format!(
        "{}/rooms/{}/subscribe",
        config.service_url.trim_end_matches('/'),
        room
    );

    let response = http
        .get(&subscribe_url)
        .bearer_auth(&token)
        .send()
        .await
        .map_err(|e| ChannelError::Subscribe(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ChannelError::Subscribe(format!("HTTP {status}")));
    }

    info!(room = %room, user = %user_id, "Subscribed to room");

    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (notif_tx, notif_rx) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::spawn(drive(
        http, config, token, room, response, cmd_rx, notif_tx,
    ));

    Ok((cmd_tx, notif_rx))
}

// ---------------------------------------------------------------------------
// Driver task
// ---------------------------------------------------------------------------

async fn drive(
    http: reqwest::Client,
    config: ChannelConfig,
    token: String,
    room: RoomId,
    response: reqwest::Response,
    mut cmd_rx: mpsc::Receiver<ChannelCommand>,
    notif_tx: mpsc::Sender<ChannelNotification>,
) {
    let mut body_stream = Box::pin(response.bytes_stream());
    let mut framer = LineFramer::new();

    if notif_tx
        .send(ChannelNotification::Subscribed { room: room.clone() })
        .await
        .is_err()
    {
        return;
    }

    let reason = loop {
        tokio::select! {
            maybe_cmd = cmd_rx.recv() => match maybe_cmd {
                Some(ChannelCommand::Publish { room, body }) => {
                    match publish(&http, &config.service_url, &token, &room, body).await {
                        Ok(ack) => debug!(room = %room, message_id = %ack.message_id, "Published"),
                        Err(e) => warn!(room = %room, error = %e, "Publish failed, message dropped"),
                    }
                }
                Some(ChannelCommand::Shutdown) | None => {
                    info!(room = %room, "Channel shut down");
                    return;
                }
            },

            maybe_chunk = body_stream.next() => match maybe_chunk {
                Some(Ok(chunk)) => {
                    for line in framer.push(&chunk) {
                        forward_record(&notif_tx, &line).await;
                    }
                }
                Some(Err(e)) => break format!("subscription stream error: {e}"),
                None => break "subscription stream ended".to_string(),
            },
        }
    };

    warn!(room = %room, reason = %reason, "Channel disconnected");
    let _ = notif_tx
        .send(ChannelNotification::Disconnected { reason })
        .await;
}

/// Parse one NDJSON line and forward it. Records that do not parse are
/// logged and skipped; the stream itself stays up.
async fn forward_record(notif_tx: &mpsc::Sender<ChannelNotification>, line: &str) {
    match serde_json::from_str::<MessageRecord>(line) {
        Ok(record) => {
            debug!(message_id = %record.id, sender = %record.sender_id, "Message received");
            let _ = notif_tx
                .send(ChannelNotification::MessageReceived { record })
                .await;
        }
        Err(e) => warn!(error = %e, "Skipping malformed record on subscription stream"),
    }
}

async fn publish(
    http: &reqwest::Client,
    service_url: &str,
    token: &str,
    room: &RoomId,
    body: String,
) -> Result<PublishResponse, ChannelError> {
    let url = format!(
        "{}/rooms/{}/messages",
        service_url.trim_end_matches('/'),
        room
    );

    let response = http
        .post(&url)
        .bearer_auth(token)
        .json(&PublishRequest { body })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ChannelError::PublishStatus(status));
    }

    Ok(response.json().await?)
}
