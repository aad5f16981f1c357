//! Tools the agent can call.
//!
//! Every tool receives its JSON arguments and the root directory of the
//! current request. File tools confine every path they touch to that root;
//! the shell tool runs with the root as its working directory.

mod files;
mod terminal;

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{FunctionSchema, ToolSchema};

pub use files::{CopyFile, DeleteFile, FileSearch, ListDirectory, MoveFile, ReadFile, WriteFile};
pub use terminal::Terminal;

/// Maximum length of a tool observation handed back to the model.
pub const MAX_OUTPUT_LEN: usize = 10_000;

/// A capability the model may invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema describing the arguments object.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// The fixed tool set bound to each agent.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the shell tool and the file management tools.
    pub fn new() -> Self {
        Self::from_tools(vec![
            Box::new(Terminal),
            Box::new(CopyFile),
            Box::new(DeleteFile),
            Box::new(FileSearch),
            Box::new(MoveFile),
            Box::new(ReadFile),
            Box::new(WriteFile),
            Box::new(ListDirectory),
        ])
    }

    pub fn from_tools(tools: Vec<Box<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Function-calling descriptors for every registered tool.
    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|t| ToolSchema {
                schema_type: "function".to_string(),
                function: FunctionSchema {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters_schema(),
                },
            })
            .collect()
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;
        tool.execute(args, workspace).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    args[key]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))
}

/// Symlink hops followed before giving up on a chain.
const MAX_LINK_HOPS: usize = 40;

/// Resolve a model-supplied path against `root`, refusing anything that escapes it.
///
/// Directories along the way are resolved through symlinks. The last
/// component is kept as given, so a link is returned as the link, but its
/// target must also stay inside `root`. `root` must already be canonical.
pub fn resolve_path(root: &Path, arg_name: &str, value: &str) -> anyhow::Result<PathBuf> {
    let entry = resolve_entry(root, arg_name, value)?;
    if link_target(&entry).starts_with(root) {
        Ok(entry)
    } else {
        Err(access_denied(arg_name, value))
    }
}

/// Like [`resolve_path`], but only the directory holding the entry must be
/// inside `root`. For tools that act on a symlink itself (delete, move).
pub fn resolve_entry(root: &Path, arg_name: &str, value: &str) -> anyhow::Result<PathBuf> {
    let candidate = Path::new(value);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };
    let normalized = normalize(&joined);

    let (parent, name) = match (normalized.parent(), normalized.file_name()) {
        (Some(parent), Some(name)) => (parent, name),
        _ => return Err(access_denied(arg_name, value)),
    };
    let entry = canonicalize_existing(parent).join(name);

    if entry.starts_with(root) {
        Ok(entry)
    } else {
        Err(access_denied(arg_name, value))
    }
}

fn access_denied(arg_name: &str, value: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Access denied to {}: {}. Permission granted exclusively to the current working directory",
        arg_name,
        value
    )
}

/// Canonicalize the longest existing ancestor of `path` and re-append the rest.
fn canonicalize_existing(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Where `path` ends up once every symlink is followed, including dangling ones.
fn link_target(path: &Path) -> PathBuf {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_LINK_HOPS {
        let target = match std::fs::read_link(&current) {
            Ok(target) => target,
            Err(_) => return canonicalize_existing(&current),
        };
        let next = match current.parent() {
            Some(parent) => parent.join(target),
            None => target,
        };
        current = canonicalize_existing(&normalize(&next));
    }
    current
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// Render `path` relative to `root` for tool output.
pub(crate) fn display_relative(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

/// Cut an observation down to `max_len` bytes on a char boundary.
pub(crate) fn truncate_output(mut output: String, max_len: usize) -> String {
    if output.len() <= max_len {
        return output;
    }
    let mut cut = max_len;
    while !output.is_char_boundary(cut) {
        cut -= 1;
    }
    output.truncate(cut);
    output.push_str("\n... [output truncated]");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        (dir, canonical)
    }

    #[test]
    fn resolve_path_accepts_nested_relative_paths() {
        let (_dir, root) = root();
        let resolved = resolve_path(&root, "file_path", "a/./b/../c.txt").unwrap();
        assert_eq!(resolved, root.join("a/c.txt"));
    }

    #[test]
    fn resolve_path_rejects_parent_traversal() {
        let (_dir, root) = root();
        let err = resolve_path(&root, "file_path", "../outside.txt").unwrap_err();
        assert!(err.to_string().contains("Access denied to file_path"));
    }

    #[test]
    fn resolve_path_rejects_absolute_outside_root() {
        let (_dir, root) = root();
        assert!(resolve_path(&root, "dir_path", "/etc").is_err());
        let inside = root.join("x.txt");
        assert_eq!(
            resolve_path(&root, "dir_path", inside.to_str().unwrap()).unwrap(),
            inside
        );
    }

    #[test]
    fn resolve_path_returns_root_for_dot() {
        let (_dir, root) = root();
        assert_eq!(resolve_path(&root, "dir_path", ".").unwrap(), root);
        assert_eq!(resolve_path(&root, "dir_path", "./").unwrap(), root);
    }

    #[cfg(unix)]
    #[test]
    fn resolve_path_refuses_new_files_under_outward_symlink() {
        let (_dir, root) = root();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("link")).unwrap();

        let err = resolve_path(&root, "file_path", "link/pwned.txt").unwrap_err();
        assert!(err.to_string().contains("Access denied to file_path: link/pwned.txt"));
        assert!(resolve_path(&root, "file_path", "link/deeper/new.txt").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn resolve_path_refuses_links_pointing_outside() {
        let (_dir, root) = root();
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.txt");
        std::fs::write(&secret, "s").unwrap();
        std::os::unix::fs::symlink(&secret, root.join("secret.txt")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("nothing"), root.join("dangling")).unwrap();

        assert!(resolve_path(&root, "file_path", "secret.txt").is_err());
        assert!(resolve_path(&root, "file_path", "dangling").is_err());
        // The link itself lives inside the root, so it can still be removed.
        assert_eq!(
            resolve_entry(&root, "file_path", "secret.txt").unwrap(),
            root.join("secret.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn resolve_path_keeps_inner_links_as_links() {
        let (_dir, root) = root();
        std::fs::create_dir(root.join("real")).unwrap();
        std::fs::write(root.join("real/a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();
        std::os::unix::fs::symlink(root.join("real/a.txt"), root.join("a_link.txt")).unwrap();

        assert_eq!(
            resolve_path(&root, "file_path", "alias/a.txt").unwrap(),
            root.join("real/a.txt")
        );
        assert_eq!(
            resolve_path(&root, "file_path", "a_link.txt").unwrap(),
            root.join("a_link.txt")
        );
    }

    #[test]
    fn display_relative_uses_dot_for_root() {
        let root = Path::new("/srv/data");
        assert_eq!(display_relative(root, root), ".");
        assert_eq!(display_relative(root, &root.join("a/b.txt")), "a/b.txt");
    }

    #[test]
    fn truncate_output_respects_char_boundaries() {
        let text = "é".repeat(10);
        let cut = truncate_output(text, 5);
        assert!(cut.starts_with("éé"));
        assert!(cut.ends_with("[output truncated]"));
        assert_eq!(truncate_output("short".to_string(), 100), "short");
    }

    #[test]
    fn registry_exposes_all_tools() {
        let registry = ToolRegistry::new();
        let mut names = registry.names();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "copy_file",
                "file_delete",
                "file_search",
                "list_directory",
                "move_file",
                "read_file",
                "terminal",
                "write_file",
            ]
        );
        let schemas = registry.get_tool_schemas();
        assert_eq!(schemas.len(), 8);
        assert!(schemas
            .iter()
            .all(|s| s.schema_type == "function" && s.function.parameters["type"] == "object"));
    }

    #[tokio::test]
    async fn registry_rejects_unknown_tool() {
        let (_dir, root) = root();
        let registry = ToolRegistry::new();
        let err = registry
            .execute("format_disk", json!({}), &root)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown tool: format_disk"));
    }
}
