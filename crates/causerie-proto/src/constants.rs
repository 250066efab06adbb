/// Maximum transport body size in bytes (256 KiB)
pub const MAX_BODY_SIZE: usize = 262_144;

/// Maximum decoded image payload accepted by the image host (10 MiB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Default HTTP port for the dev server
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Bearer scheme used by the chat backend
pub const AUTH_SCHEME_BEARER: &str = "Bearer";

/// Client-ID scheme used by the image host
pub const AUTH_SCHEME_CLIENT_ID: &str = "Client-ID";
