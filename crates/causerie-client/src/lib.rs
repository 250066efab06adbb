//! Headless core of a chat-room screen.
//!
//! Wires the pub/sub channel, the image-host upload queue, and the
//! platform location seam into one event-driven session. The embedding UI
//! sends [`screen::ScreenCommand`]s through a [`screen::ScreenHandle`] and
//! renders the [`events::ScreenEvent`]s it receives back.

pub mod error;
pub mod events;
pub mod location;
pub mod screen;
pub mod state;
pub mod upload;

pub use error::{ClientError, LocationError, UploadError};
pub use events::ScreenEvent;
pub use location::{LocationFix, LocationPolicy, LocationProvider, StaticLocation};
pub use screen::{activate, ScreenConfig, ScreenHandle};
pub use upload::{ImageData, ImageHostClient, ImageHostConfig};
