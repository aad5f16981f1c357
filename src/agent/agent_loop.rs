//! Core agent loop implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm::{ChatMessage, LlmClient, ToolCall};
use crate::tools::ToolRegistry;

use super::AgentError;

/// One tool call executed during a run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    pub arguments: String,
    /// The text handed back to the model.
    pub observation: String,
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutput {
    pub output: String,
    pub steps: Vec<AgentStep>,
}

/// A per-request agent bound to one root directory.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    model: String,
    root_dir: PathBuf,
    system_prompt: String,
    max_iterations: Option<usize>,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        model: String,
        root_dir: PathBuf,
        system_prompt: String,
    ) -> Self {
        Self {
            llm,
            tools,
            model,
            root_dir,
            system_prompt,
            max_iterations: None,
        }
    }

    /// Cap the number of model calls per run.
    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run one instruction to completion.
    pub async fn run(&self, instruction: &str) -> Result<AgentOutput, AgentError> {
        let mut steps = Vec::new();
        let mut messages = vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(instruction),
        ];

        let tool_schemas = self.tools.get_tool_schemas();
        let mut iteration = 0usize;

        loop {
            if let Some(max) = self.max_iterations {
                if iteration >= max {
                    tracing::warn!("Agent stopped after {} iterations", max);
                    return Err(AgentError::MaxIterations(max));
                }
            }
            iteration += 1;
            tracing::debug!("Agent iteration {}", iteration);

            let response = self
                .llm
                .chat_completion(&self.model, &messages, Some(tool_schemas.as_slice()))
                .await?;

            if let Some(tool_calls) = response.tool_calls.filter(|calls| !calls.is_empty()) {
                messages.push(ChatMessage::assistant_tool_calls(
                    response.content.clone(),
                    tool_calls.clone(),
                ));

                for tool_call in &tool_calls {
                    tracing::info!(
                        "Calling tool: {} with args: {}",
                        tool_call.function.name,
                        tool_call.function.arguments
                    );

                    let observation = self.execute_tool_call(tool_call).await;

                    tracing::info!("Tool result: {}", truncate_for_log(&observation, 1000));

                    steps.push(AgentStep {
                        timestamp: Utc::now(),
                        tool: tool_call.function.name.clone(),
                        arguments: tool_call.function.arguments.clone(),
                        observation: observation.clone(),
                    });

                    messages.push(ChatMessage::tool_result(tool_call.id.clone(), observation));
                }

                continue;
            }

            // No tool calls - this is the final response
            return match response.content {
                Some(content) => {
                    tracing::info!(
                        iterations = iteration,
                        tool_calls = steps.len(),
                        "Agent finished: {}",
                        truncate_for_log(&content, 2000)
                    );
                    Ok(AgentOutput {
                        output: content,
                        steps,
                    })
                }
                None => Err(AgentError::EmptyResponse),
            };
        }
    }

    /// Execute a single tool call and fold the outcome into an observation.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> String {
        let name = &tool_call.function.name;

        if self.tools.get(name).is_none() {
            return format!(
                "{} is not a valid tool, try one of [{}].",
                name,
                self.tools.names().join(", ")
            );
        }

        let raw = tool_call.function.arguments.trim();
        let args = if raw.is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            match serde_json::from_str(raw) {
                Ok(value) => value,
                Err(e) => return format!("Error: invalid arguments for {}: {}", name, e),
            }
        };

        match self.tools.execute(name, args, &self.root_dir).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                format!("Error: {}", e)
            }
        }
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... [truncated]", &s[..cut])
}
