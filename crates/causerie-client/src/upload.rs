//! Client for the image-hosting HTTP API.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

use causerie_proto::constants::AUTH_SCHEME_CLIENT_ID;
use causerie_proto::{ImageUploadRequest, ImageUploadResponse};

use crate::error::UploadError;

/// Raw image bytes as handed over by the platform picker.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    /// Full upload endpoint URL.
    pub upload_url: String,
    /// API key carried as `Authorization: Client-ID <key>`.
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct ImageHostClient {
    config: ImageHostConfig,
    http: reqwest::Client,
}

impl ImageHostClient {
    pub fn new(config: ImageHostConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Upload one image, returning its public link.
    ///
    /// One attempt only; the caller decides what a failure means (the
    /// upload queue drops the image and moves on).
    pub async fn upload(&self, image: &ImageData) -> Result<String, UploadError> {
        let encoded = BASE64.encode(&image.bytes);

        let response = self
            .http
            .post(&self.config.upload_url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{AUTH_SCHEME_CLIENT_ID} {}", self.config.api_key),
            )
            .json(&ImageUploadRequest { image: encoded })
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(UploadError::Status(status));
        }

        let parsed: ImageUploadResponse = response.json().await?;
        debug!(link = %parsed.data.link, size = image.bytes.len(), "Image uploaded");
        Ok(parsed.data.link)
    }
}
