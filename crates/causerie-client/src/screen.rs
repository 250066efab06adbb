//! The room screen driver: one task that owns the screen state and wires
//! UI commands, channel notifications, and background completions together.
//!
//! Everything the screen does funnels through this single task, so the
//! display-order and single-flight-upload invariants need no locking: the
//! task *is* the event loop.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use causerie_channel::{ChannelCommand, ChannelConfig, ChannelNotification};
use causerie_proto::{DisplayBody, DisplayMessage, MessageRecord, Payload, RoomId, UserId};

use crate::error::{ClientError, LocationError, UploadError};
use crate::events::ScreenEvent;
use crate::location::{LocationFix, LocationPolicy, LocationProvider};
use crate::state::ScreenState;
use crate::upload::{ImageData, ImageHostClient, ImageHostConfig};

/// Commands the embedding UI sends to the screen.
#[derive(Debug)]
pub enum ScreenCommand {
    /// Send a plain text message.
    SendText(String),
    /// Queue a picked image for upload-then-send.
    AttachImage(ImageData),
    /// Fetch the current position once and send it as a location message.
    ShareLocation,
    /// Snapshot of the display list.
    Snapshot(oneshot::Sender<Vec<DisplayMessage>>),
    /// Tear the screen down (unsubscribes the channel).
    Deactivate,
}

/// Completions of work the driver dispatched earlier.
#[derive(Debug)]
enum Completion {
    UploadDone(Result<String, UploadError>),
    LocationFixed(Result<LocationFix, LocationError>),
}

/// Everything needed to bring a room screen up.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    pub channel: ChannelConfig,
    pub image_host: ImageHostConfig,
    /// Session identity, handed in by navigation.
    pub user_id: UserId,
    /// The one room this screen shows.
    pub room: RoomId,
    pub location_policy: LocationPolicy,
}

/// Cloneable handle the embedder keeps while the screen is active.
#[derive(Debug, Clone)]
pub struct ScreenHandle {
    cmd_tx: mpsc::Sender<ScreenCommand>,
}

impl ScreenHandle {
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.send(ScreenCommand::SendText(text.into())).await
    }

    pub async fn attach_image(&self, image: ImageData) -> Result<(), ClientError> {
        self.send(ScreenCommand::AttachImage(image)).await
    }

    pub async fn share_location(&self) -> Result<(), ClientError> {
        self.send(ScreenCommand::ShareLocation).await
    }

    /// Copy of the display list, in arrival order.
    pub async fn snapshot(&self) -> Result<Vec<DisplayMessage>, ClientError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(ScreenCommand::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| ClientError::Deactivated)
    }

    pub async fn deactivate(&self) -> Result<(), ClientError> {
        self.send(ScreenCommand::Deactivate).await
    }

    async fn send(&self, cmd: ScreenCommand) -> Result<(), ClientError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ClientError::Deactivated)
    }
}

/// Capacity of the command and event channels.
const SCREEN_CAPACITY: usize = 64;

/// Connect to the channel, subscribe the room, and spawn the driver task.
///
/// Returns the command handle and the event stream. Fails only if the
/// initial connect/subscribe fails; everything after that degrades
/// per-action instead of killing the screen.
pub async fn activate(
    config: ScreenConfig,
    location: Arc<dyn LocationProvider>,
) -> Result<(ScreenHandle, mpsc::Receiver<ScreenEvent>), ClientError> {
    let (chan_tx, chan_rx) = match causerie_channel::connect(
        config.channel.clone(),
        config.user_id.clone(),
        config.room.clone(),
    )
    .await
    {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "Failed to connect to channel");
            return Err(e.into());
        }
    };

    let uploader = ImageHostClient::new(config.image_host.clone(), reqwest::Client::new());

    let (cmd_tx, cmd_rx) = mpsc::channel(SCREEN_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(SCREEN_CAPACITY);
    let (done_tx, done_rx) = mpsc::channel(SCREEN_CAPACITY);

    let driver = Driver {
        room: config.room.clone(),
        state: ScreenState::new(),
        uploader,
        location,
        policy: config.location_policy.clone(),
        chan_tx,
        event_tx,
        done_tx,
        channel_closed: false,
    };

    info!(room = %config.room, user = %config.user_id, "Room screen activated");
    tokio::spawn(driver.run(cmd_rx, chan_rx, done_rx));

    Ok((ScreenHandle { cmd_tx }, event_rx))
}

struct Driver {
    room: RoomId,
    state: ScreenState,
    uploader: ImageHostClient,
    location: Arc<dyn LocationProvider>,
    policy: LocationPolicy,
    chan_tx: mpsc::Sender<ChannelCommand>,
    event_tx: mpsc::Sender<ScreenEvent>,
    /// Cloned into spawned uploads/fetches; completions come back here.
    done_tx: mpsc::Sender<Completion>,
    channel_closed: bool,
}

impl Driver {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<ScreenCommand>,
        mut chan_rx: mpsc::Receiver<ChannelNotification>,
        mut done_rx: mpsc::Receiver<Completion>,
    ) {
        loop {
            tokio::select! {
                maybe_cmd = cmd_rx.recv() => match maybe_cmd {
                    Some(ScreenCommand::SendText(text)) => {
                        self.send_payload(Payload::text(text)).await;
                    }
                    Some(ScreenCommand::AttachImage(image)) => self.enqueue_image(image),
                    Some(ScreenCommand::ShareLocation) => self.spawn_location_fetch(),
                    Some(ScreenCommand::Snapshot(reply)) => {
                        let _ = reply.send(self.state.messages.clone());
                    }
                    Some(ScreenCommand::Deactivate) | None => {
                        let _ = self.chan_tx.send(ChannelCommand::Shutdown).await;
                        info!(room = %self.room, "Room screen deactivated");
                        return;
                    }
                },

                maybe_notif = chan_rx.recv(), if !self.channel_closed => match maybe_notif {
                    Some(ChannelNotification::Subscribed { room }) => {
                        debug!(room = %room, "Subscription live");
                    }
                    Some(ChannelNotification::MessageReceived { record }) => {
                        self.append_incoming(record).await;
                    }
                    Some(ChannelNotification::Disconnected { reason }) => {
                        warn!(room = %self.room, reason = %reason, "Channel closed");
                        let _ = self
                            .event_tx
                            .send(ScreenEvent::ChannelClosed { reason })
                            .await;
                    }
                    None => self.channel_closed = true,
                },

                // The driver holds a done_tx clone, so this never yields None.
                Some(done) = done_rx.recv() => match done {
                    Completion::UploadDone(result) => self.on_upload_done(result).await,
                    Completion::LocationFixed(result) => self.on_location_fixed(result).await,
                },
            }
        }
    }

    /// Decode an inbound record and append it, in arrival order. Outbound
    /// messages are never appended locally — they show up here when the
    /// transport delivers them back.
    async fn append_incoming(&mut self, record: MessageRecord) {
        let message = DisplayMessage {
            id: record.id,
            created_at: record.created_at,
            sender_id: record.sender_id,
            sender_name: record.sender_name,
            body: DisplayBody::from_body(&record.body),
        };

        self.state.messages.push(message.clone());
        debug!(
            message_id = %message.id,
            total = self.state.messages.len(),
            "Message appended"
        );

        if self
            .event_tx
            .send(ScreenEvent::MessageAppended(message))
            .await
            .is_err()
        {
            debug!("Embedder dropped the event receiver");
        }
    }

    /// Encode and publish. Encoding a well-formed payload cannot fail and a
    /// closed channel just drops the message; neither aborts the screen.
    async fn send_payload(&self, payload: Payload) {
        let body = match payload.to_body() {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to encode envelope, message dropped");
                return;
            }
        };

        let publish = ChannelCommand::Publish {
            room: self.room.clone(),
            body,
        };
        if self.chan_tx.send(publish).await.is_err() {
            warn!(room = %self.room, "Channel is gone, outbound message dropped");
        }
    }

    // -- upload queue -------------------------------------------------------

    fn enqueue_image(&mut self, image: ImageData) {
        self.state.pending_images.push_back(image);
        debug!(pending = self.state.pending_images.len(), "Image queued");
        self.maybe_dispatch_upload();
    }

    /// Dispatch an upload for the queue head unless one is already out.
    fn maybe_dispatch_upload(&mut self) {
        if self.state.upload_in_flight {
            return;
        }
        let Some(head) = self.state.pending_images.front() else {
            return;
        };
        let image = head.clone();

        self.state.upload_in_flight = true;
        let uploader = self.uploader.clone();
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            let result = uploader.upload(&image).await;
            let _ = done_tx.send(Completion::UploadDone(result)).await;
        });
    }

    /// Head upload finished: on success share the link, on failure drop the
    /// image. Either way pop the head and keep the queue moving.
    async fn on_upload_done(&mut self, result: Result<String, UploadError>) {
        match result {
            Ok(link) => self.send_payload(Payload::image(link)).await,
            Err(e) => warn!(error = %e, "Image upload failed, image dropped"),
        }

        self.state.pending_images.pop_front();
        self.state.upload_in_flight = false;
        self.maybe_dispatch_upload();
    }

    // -- location -----------------------------------------------------------

    fn spawn_location_fetch(&self) {
        let provider = self.location.clone();
        let policy = self.policy.clone();
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            let result = provider.current_position(&policy).await;
            let _ = done_tx.send(Completion::LocationFixed(result)).await;
        });
    }

    async fn on_location_fixed(&mut self, result: Result<LocationFix, LocationError>) {
        match result {
            Ok(fix) => {
                self.send_payload(Payload::location(fix.latitude, fix.longitude))
                    .await;
            }
            Err(e) => {
                warn!(error = %e, "Location fetch failed");
                let _ = self
                    .event_tx
                    .send(ScreenEvent::LocationFailed(e.to_string()))
                    .await;
            }
        }
    }
}
