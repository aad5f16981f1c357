//! # File Agent
//!
//! An HTTP service that hands a natural-language instruction to a hosted,
//! tool-calling chat model and lets it manage files under a root directory.
//!
//! This library provides:
//! - An HTTP API (`POST /agent`) taking `{msg, root_dir}`
//! - A per-request agent bound to the root directory
//! - File management tools (copy, move, read, write, list, search, delete) and a shell tool
//! - An OpenAI-compatible chat completions client
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive an instruction via the API
//! 2. Build context with the instruction template and available tools
//! 3. Call the model, execute any tool calls it requests
//! 4. Feed results back to the model, repeat until it answers
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use file_agent::{agent::build_file_agent, config::Config, llm::OpenAiClient};
//!
//! let config = Config::from_env()?;
//! let llm = Arc::new(OpenAiClient::new(config.api_key.clone(), config.base_url.clone()));
//! let agent = build_file_agent(&config, llm, Some("./notes")).await?;
//! let result = agent.run("Create a folder named archive").await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
