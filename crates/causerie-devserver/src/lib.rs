//! Local stand-in for the two hosted collaborators the room screen talks
//! to: the pub/sub chat backend (token provider, room subscriptions,
//! publish) and the image host. Used for development and integration
//! tests; state is in-memory only.

pub mod api;
pub mod config;
pub mod error;
pub mod images;
pub mod rooms;

pub use api::{spawn, DevServer};
pub use config::ServerConfig;
pub use error::ServerError;
