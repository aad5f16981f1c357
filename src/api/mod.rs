//! HTTP API for the file agent.
//!
//! ## Endpoints
//!
//! - `POST /agent` - Run an instruction against a root directory
//! - `GET /health` - Health check

mod error;
mod routes;
pub mod types;

use std::sync::Arc;

use crate::config::Config;
use crate::llm::OpenAiClient;

pub use error::ApiError;
pub use routes::{router, AppState};

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let llm = Arc::new(OpenAiClient::new(config.api_key.clone(), config.base_url.clone()));
    let addr = format!("{}:{}", config.host, config.port);
    let app = router(Arc::new(AppState::new(config, llm)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
