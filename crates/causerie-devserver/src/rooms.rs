//! Per-room fan-out of message records to live subscribers.
//!
//! Rooms exist implicitly: the first subscribe or publish creates the
//! broadcast channel. A publisher's own subscription receives its messages
//! like any other — clients rely on that echo instead of appending locally.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

use causerie_proto::{MessageRecord, RoomId};

use crate::error::ServerError;

/// Buffered records per room before slow subscribers start lagging.
const ROOM_BUFFER: usize = 256;

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, broadcast::Sender<MessageRecord>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subscriber to `room`, creating the room if needed.
    pub fn join(&self, room: &RoomId) -> Result<broadcast::Receiver<MessageRecord>, ServerError> {
        Ok(self.sender(room)?.subscribe())
    }

    /// Deliver `record` to every current subscriber of `room`.
    ///
    /// Returns how many subscribers received it; zero (nobody listening)
    /// is not an error.
    pub fn publish(&self, room: &RoomId, record: MessageRecord) -> Result<usize, ServerError> {
        let delivered = self.sender(room)?.send(record).unwrap_or(0);
        debug!(room = %room, delivered, "Record published");
        Ok(delivered)
    }

    fn sender(&self, room: &RoomId) -> Result<broadcast::Sender<MessageRecord>, ServerError> {
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|e| ServerError::Internal(format!("Room registry lock poisoned: {e}")))?;
        let sender = rooms
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(ROOM_BUFFER).0);
        Ok(sender.clone())
    }
}
