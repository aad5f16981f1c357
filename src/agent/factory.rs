//! Builds one agent per request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::llm::LlmClient;
use crate::tools::ToolRegistry;

use super::{Agent, AgentError, PromptTemplate};

/// Resolve `root_dir` against `workspace` and check that it is a directory.
///
/// The returned path is canonical; file tools rely on that for confinement.
pub fn resolve_root_dir(workspace: &Path, root_dir: Option<&str>) -> Result<PathBuf, AgentError> {
    let requested = root_dir.unwrap_or("./");
    let candidate = workspace.join(requested);

    let canonical = candidate
        .canonicalize()
        .map_err(|e| AgentError::InvalidRoot {
            path: candidate.clone(),
            reason: e.to_string(),
        })?;

    if !canonical.is_dir() {
        return Err(AgentError::InvalidRoot {
            path: canonical,
            reason: "not a directory".to_string(),
        });
    }

    Ok(canonical)
}

/// Build a file management agent bound to `root_dir`.
///
/// Nothing on disk is touched here; side effects only happen in [`Agent::run`].
pub async fn build_file_agent(
    config: &Config,
    llm: Arc<dyn LlmClient>,
    root_dir: Option<&str>,
) -> Result<Agent, AgentError> {
    let root = resolve_root_dir(&config.workspace_path, root_dir)?;

    let template = match &config.prompt_template_url {
        Some(url) => PromptTemplate::fetch(url).await?,
        None => PromptTemplate::builtin(),
    };

    let tools = ToolRegistry::new();
    let system_prompt = template.render(&root.to_string_lossy(), &tools);

    tracing::debug!(root = %root.display(), model = %config.default_model, "Built file agent");

    Ok(Agent::new(llm, tools, config.default_model.clone(), root, system_prompt)
        .with_max_iterations(config.max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, ChatResponse, LlmError, ToolSchema};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl LlmClient for Unreachable {
        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolSchema]>,
        ) -> Result<ChatResponse, LlmError> {
            unreachable!("construction must not call the model")
        }
    }

    #[test]
    fn resolve_root_dir_defaults_to_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let root = resolve_root_dir(dir.path(), None).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn resolve_root_dir_accepts_relative_and_absolute() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let canonical_sub = dir.path().join("sub").canonicalize().unwrap();

        assert_eq!(resolve_root_dir(dir.path(), Some("sub")).unwrap(), canonical_sub);
        assert_eq!(
            resolve_root_dir(Path::new("/nonexistent"), Some(canonical_sub.to_str().unwrap())).unwrap(),
            canonical_sub
        );
    }

    #[test]
    fn resolve_root_dir_rejects_missing_and_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plain.txt"), "x").unwrap();

        assert!(matches!(
            resolve_root_dir(dir.path(), Some("missing")),
            Err(AgentError::InvalidRoot { .. })
        ));
        let err = resolve_root_dir(dir.path(), Some("plain.txt")).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[tokio::test]
    async fn build_file_agent_renders_builtin_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new("k".into(), "gpt-4o-mini".into(), dir.path().to_path_buf());

        let agent = build_file_agent(&config, Arc::new(Unreachable), Some("./"))
            .await
            .unwrap();

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(agent.root_dir(), root.as_path());
        assert!(agent
            .system_prompt()
            .contains(&*root.to_string_lossy()));
    }

    #[tokio::test]
    async fn build_file_agent_fails_when_template_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new("k".into(), "m".into(), dir.path().to_path_buf());
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        config.prompt_template_url = Some("http://127.0.0.1:9/template".to_string());

        let err = build_file_agent(&config, Arc::new(Unreachable), None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AgentError::Prompt(_)));
    }
}
