//! Instruction template for the agent.

use crate::tools::ToolRegistry;

use super::AgentError;

/// Built-in template. `{root_dir}` and `{tools}` are substituted at render time.
pub const DEFAULT_TEMPLATE: &str = r#"You are a helpful assistant that manages files on the user's machine.

You operate in the root directory: {root_dir}
All relative paths are resolved against it, and file tools cannot reach outside it.

You have access to the following tools:
{tools}

Use tools to inspect the file system instead of guessing. Create missing parent
folders when asked to create a file inside them. When you are done, reply with a
short summary of what you did, or with the information the user asked for."#;

/// The system prompt template bound to an agent.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn builtin() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }

    /// Fetch a template from a remote store.
    pub async fn fetch(url: &str) -> Result<Self, AgentError> {
        tracing::debug!(url = url, "Fetching prompt template");

        let response = reqwest::get(url)
            .await
            .map_err(|e| AgentError::Prompt(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Prompt(format!("{} returned {}", url, status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AgentError::Prompt(format!("{}: {}", url, e)))?;

        if text.trim().is_empty() {
            return Err(AgentError::Prompt(format!("{} returned an empty template", url)));
        }

        Ok(Self::new(text))
    }

    pub fn render(&self, root_dir: &str, tools: &ToolRegistry) -> String {
        let tool_descriptions = tools
            .list_tools()
            .iter()
            .map(|t| format!("- **{}**: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n");

        self.text
            .replace("{root_dir}", root_dir)
            .replace("{tools}", &tool_descriptions)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}
