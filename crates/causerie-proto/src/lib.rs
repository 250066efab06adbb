// Wire shapes shared by the channel client, the room screen, and the dev server.

pub mod api;
pub mod constants;
pub mod envelope;
pub mod types;

pub use api::{
    ImageLink, ImageUploadRequest, ImageUploadResponse, MessageRecord, PublishRequest,
    PublishResponse, TokenRequest, TokenResponse,
};
pub use envelope::{DisplayBody, Payload};
pub use types::{DisplayMessage, RoomId, UserId};
