// Client for the hosted pub/sub chat backend: authenticated connect, one
// room subscription per session, fire-and-forget publish.

pub mod error;
pub mod session;
pub mod stream;
pub mod token;

pub use error::ChannelError;
pub use session::{connect, ChannelCommand, ChannelConfig, ChannelNotification};
pub use stream::LineFramer;
pub use token::TokenProvider;
