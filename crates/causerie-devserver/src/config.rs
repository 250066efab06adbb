//! Dev-server configuration loaded from environment variables.
//!
//! All settings have defaults so the server starts with zero configuration.

use std::net::SocketAddr;

use causerie_proto::constants::{DEFAULT_HTTP_PORT, MAX_BODY_SIZE, MAX_IMAGE_SIZE};

/// Dev-server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP API.
    /// Env: `HTTP_ADDR`
    /// Default: `127.0.0.1:8080`
    pub http_addr: SocketAddr,

    /// Human-readable name reported by `/health`.
    /// Env: `INSTANCE_NAME`
    /// Default: `"causerie dev"`
    pub instance_name: String,

    /// Maximum decoded image size in bytes.
    /// Env: `MAX_IMAGE_SIZE`
    /// Default: 10 MiB
    pub max_image_size: usize,

    /// Maximum message body size in bytes (256 KiB).
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([127, 0, 0, 1], DEFAULT_HTTP_PORT).into(),
            instance_name: "causerie dev".to_string(),
            max_image_size: MAX_IMAGE_SIZE,
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(name) = std::env::var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Ok(val) = std::env::var("MAX_IMAGE_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_image_size = n;
            } else {
                tracing::warn!(value = %val, "Invalid MAX_IMAGE_SIZE, using default");
            }
        }

        config
    }

    /// Port 0 on the loopback interface, for tests that need a free port.
    pub fn ephemeral() -> Self {
        Self {
            http_addr: ([127, 0, 0, 1], 0).into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 8080).into());
        assert_eq!(config.max_body_size, MAX_BODY_SIZE);
    }

    #[test]
    fn test_ephemeral_uses_port_zero() {
        assert_eq!(ServerConfig::ephemeral().http_addr.port(), 0);
    }
}
