use serde::Serialize;

use causerie_proto::DisplayMessage;

/// Events the room screen emits to its embedder.
///
/// Payloads stay serializable so GUI embedders can forward them across an
/// IPC bridge unchanged.
#[derive(Debug, Clone, Serialize)]
pub enum ScreenEvent {
    /// A message was decoded and appended to the display list.
    MessageAppended(DisplayMessage),
    /// A location fix could not be obtained. The UI is expected to surface
    /// this to the user as a blocking alert.
    LocationFailed(String),
    /// The channel subscription ended. No automatic reconnect; re-activate
    /// the screen to get a new one.
    ChannelClosed { reason: String },
}
