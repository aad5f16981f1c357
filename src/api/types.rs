//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request to run the agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRequest {
    /// The instruction for the agent
    pub msg: String,

    /// Directory the file tools operate in, relative to the workspace
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
}

fn default_root_dir() -> String {
    "./".to_string()
}

/// Final answer of the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub msg: String,
}

/// Error envelope returned for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
