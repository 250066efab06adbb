use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Channel error: {0}")]
    Channel(#[from] causerie_channel::ChannelError),

    #[error("Screen is no longer active")]
    Deactivated,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Image host returned HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Timed out waiting for a position fix")]
    Timeout,

    #[error("Positioning unavailable: {0}")]
    Unavailable(String),
}
