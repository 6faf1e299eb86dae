//! NoteSpace HTTP Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 3001, default DB path)
//! cargo run --bin notespace-server
//!
//! # Custom port
//! NOTESPACE_PORT=3002 cargo run --bin notespace-server
//! ```
//!
//! # Environment Variables
//!
//! - `NOTESPACE_CONFIG`: JSON config file (default: ~/.notespace/server.json)
//! - `NOTESPACE_PORT`: Server port (default: 3001)
//! - `NOTESPACE_DB_PATH`: Database file (default: ~/.notespace/database/notespace.db)
//! - `NOTESPACE_MAX_CONTENT_LENGTH`: Maximum note content length (default: 20000)
//! - `CORS_ALLOW_ORIGIN`: Comma-separated allowed origins
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use notespace_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🚀 NoteSpace Server");
    tracing::info!("==================================");

    let config = ServerConfig::load()?;
    tracing::info!("📡 Port: {}", config.port);
    tracing::info!("📝 Max content length: {}", config.max_content_length);

    notespace_server::start_server(config).await?;

    Ok(())
}
