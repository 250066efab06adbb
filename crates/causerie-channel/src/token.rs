use tracing::debug;

use causerie_proto::{TokenRequest, TokenResponse, UserId};

use crate::error::ChannelError;

/// Client for the token-provider endpoint.
///
/// The token itself is opaque; whatever authentication happens lives behind
/// the endpoint.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    endpoint: String,
    http: reqwest::Client,
}

impl TokenProvider {
    pub fn new(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            http,
        }
    }

    /// Fetch an access token for `user_id`.
    pub async fn fetch(&self, user_id: &UserId) -> Result<String, ChannelError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&TokenRequest {
                user_id: user_id.clone(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Token(format!("HTTP {status}")));
        }

        let token: TokenResponse = response.json().await?;
        if token.access_token.is_empty() {
            return Err(ChannelError::Token("empty access token".to_string()));
        }

        debug!(user = %user_id, "Obtained access token");
        Ok(token.access_token)
    }
}
