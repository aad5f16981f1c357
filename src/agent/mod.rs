//! Agent module - builds and runs the file management agent.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with the instruction template and the user instruction
//! 2. Call the hosted model with the available tools
//! 3. If the model requests tool calls, execute them and feed the results back
//! 4. Repeat until the model produces a final response (or the optional cap is hit)

mod agent_loop;
mod factory;
mod prompt;

use std::path::PathBuf;

use thiserror::Error;

use crate::llm::LlmError;

pub use agent_loop::{Agent, AgentOutput, AgentStep};
pub use factory::{build_file_agent, resolve_root_dir};
pub use prompt::{PromptTemplate, DEFAULT_TEMPLATE};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid root directory {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Failed to load prompt template: {0}")]
    Prompt(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("LLM returned empty response")]
    EmptyResponse,

    #[error("Max iterations ({0}) reached without completion")]
    MaxIterations(usize),
}
