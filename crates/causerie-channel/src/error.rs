use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Token provider rejected the request: {0}")]
    Token(String),

    #[error("Subscription failed: {0}")]
    Subscribe(String),

    #[error("Publish rejected with HTTP status {0}")]
    PublishStatus(reqwest::StatusCode),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Channel task is no longer running")]
    Closed,
}
