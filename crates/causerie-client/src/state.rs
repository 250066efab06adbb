//! Per-activation state owned by the room screen's driver task.

use std::collections::VecDeque;

use causerie_proto::DisplayMessage;

use crate::upload::ImageData;

/// Everything the screen remembers while active. Rebuilt from scratch on
/// each activation and dropped on teardown; nothing persists.
#[derive(Debug, Default)]
pub struct ScreenState {
    /// Display list, append-only, in arrival order.
    pub messages: Vec<DisplayMessage>,

    /// Images waiting for upload, FIFO.
    pub pending_images: VecDeque<ImageData>,

    /// True iff an upload has been dispatched for the head of
    /// `pending_images`. At most one upload is outstanding at any time.
    pub upload_in_flight: bool,
}

impl ScreenState {
    pub fn new() -> Self {
        Self::default()
    }
}
