//! # causerie-devserver
//!
//! Local stand-in for the hosted services the room screen depends on:
//! - **Token provider** (`POST /token`)
//! - **Pub/sub chat backend** (`GET /rooms/{room}/subscribe` NDJSON stream,
//!   `POST /rooms/{room}/messages`)
//! - **Image host** (`POST /images/upload`, `GET /images/{id}`)
//!
//! Everything is in-memory; restart and it is gone.

use tracing::info;
use tracing_subscriber::EnvFilter;

use causerie_devserver::{spawn, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,causerie_devserver=debug")),
        )
        .init();

    info!("Starting causerie dev server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    let server = spawn(config).await?;

    tokio::select! {
        _ = server.wait() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
