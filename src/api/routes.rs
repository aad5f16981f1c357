//! Router and request handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::agent::build_file_agent;
use crate::config::Config;
use crate::llm::LlmClient;

use super::error::ApiError;
use super::types::{AgentRequest, AgentResponse, HealthResponse};

/// Immutable state shared by all requests.
pub struct AppState {
    pub config: Config,
    pub llm: Arc<dyn LlmClient>,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn LlmClient>) -> Self {
        Self { config, llm }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/agent", post(run_agent))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /agent - build an agent for `root_dir` and run `msg` through it.
async fn run_agent(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Json<AgentResponse>, ApiError> {
    // Syntax, content-type and schema errors all surface as 422 {"detail"}.
    let Json(req) = payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

    if req.msg.trim().is_empty() {
        return Err(ApiError::Validation("msg must not be empty".to_string()));
    }

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("agent_request", %run_id, root_dir = %req.root_dir);

    let response = execute(&state, req).instrument(span).await?;
    Ok(Json(response))
}

/// Construct the agent and run the instruction. Any failure here is a 500.
async fn execute(state: &AppState, req: AgentRequest) -> Result<AgentResponse, ApiError> {
    tracing::info!("Received instruction: {}", req.msg);

    let agent = build_file_agent(&state.config, state.llm.clone(), Some(&req.root_dir))
        .await
        .map_err(|e| {
            tracing::error!("Failed to build agent: {}", e);
            ApiError::from(e)
        })?;

    let result = agent.run(&req.msg).await.map_err(|e| {
        tracing::error!("Agent run failed: {}", e);
        ApiError::from(e)
    })?;

    tracing::info!(tool_calls = result.steps.len(), "Agent request completed");

    Ok(AgentResponse { msg: result.output })
}
