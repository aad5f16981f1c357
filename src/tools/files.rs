//! File management tools: copy, move, read, write, list, search, delete.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    display_relative, required_str, resolve_entry, resolve_path, truncate_output, Tool,
    MAX_OUTPUT_LEN,
};

async fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create directory {}: {}", parent.display(), e))?;
    }
    Ok(())
}

/// Copy a file.
pub struct CopyFile;

#[async_trait]
impl Tool for CopyFile {
    fn name(&self) -> &str {
        "copy_file"
    }

    fn description(&self) -> &str {
        "Create a copy of a file in a specified location"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_path": {
                    "type": "string",
                    "description": "Path of the file to copy"
                },
                "destination_path": {
                    "type": "string",
                    "description": "Path to save the copied file"
                }
            },
            "required": ["source_path", "destination_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let source_arg = required_str(&args, "source_path")?;
        let dest_arg = required_str(&args, "destination_path")?;
        let source = resolve_path(workspace, "source_path", source_arg)?;
        let mut dest = resolve_path(workspace, "destination_path", dest_arg)?;

        if !source.is_file() {
            return Err(anyhow::anyhow!("No such file: {}", source_arg));
        }

        // Copying onto an existing directory places the copy inside it.
        if dest.is_dir() {
            if let Some(file_name) = source.file_name() {
                dest = dest.join(file_name);
            }
        }

        ensure_parent(&dest).await?;
        tokio::fs::copy(&source, &dest)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to copy {} to {}: {}", source_arg, dest_arg, e))?;

        Ok(format!(
            "File copied successfully from {} to {}.",
            source_arg,
            display_relative(workspace, &dest)
        ))
    }
}

/// Move or rename a file or directory.
pub struct MoveFile;

#[async_trait]
impl Tool for MoveFile {
    fn name(&self) -> &str {
        "move_file"
    }

    fn description(&self) -> &str {
        "Move or rename a file from one location to another"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_path": {
                    "type": "string",
                    "description": "Path of the file to move"
                },
                "destination_path": {
                    "type": "string",
                    "description": "New path for the moved file"
                }
            },
            "required": ["source_path", "destination_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let source_arg = required_str(&args, "source_path")?;
        let dest_arg = required_str(&args, "destination_path")?;
        let source = resolve_entry(workspace, "source_path", source_arg)?;
        let mut dest = resolve_path(workspace, "destination_path", dest_arg)?;

        if tokio::fs::symlink_metadata(&source).await.is_err() {
            return Err(anyhow::anyhow!("No such file or directory: {}", source_arg));
        }
        if source == workspace {
            return Err(anyhow::anyhow!("Refusing to move the root directory"));
        }

        // Moving onto an existing directory places the source inside it.
        if dest.is_dir() {
            if let Some(file_name) = source.file_name() {
                dest = dest.join(file_name);
            }
        }

        ensure_parent(&dest).await?;
        tokio::fs::rename(&source, &dest)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to move {} to {}: {}", source_arg, dest_arg, e))?;

        Ok(format!(
            "File moved successfully from {} to {}.",
            source_arg,
            display_relative(workspace, &dest)
        ))
    }
}

/// Read a file.
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read file from disk"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "name of file"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_arg = required_str(&args, "file_path")?;
        let path = resolve_path(workspace, "file_path", file_arg)?;

        if !path.is_file() {
            return Err(anyhow::anyhow!("no such file or directory: {}", file_arg));
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file_arg, e))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Write or append to a file, creating parent directories.
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write file to disk. Missing parent directories are created."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "name of file"
                },
                "text": {
                    "type": "string",
                    "description": "text to write to file"
                },
                "append": {
                    "type": "boolean",
                    "description": "Whether to append to an existing file (default: false)"
                }
            },
            "required": ["file_path", "text"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_arg = required_str(&args, "file_path")?;
        let text = args["text"].as_str().unwrap_or("");
        let append = args["append"].as_bool().unwrap_or(false);
        let path = resolve_path(workspace, "file_path", file_arg)?;

        if path.is_dir() {
            return Err(anyhow::anyhow!("{} is a directory", file_arg));
        }

        ensure_parent(&path).await?;

        if append {
            use tokio::io::AsyncWriteExt;

            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", file_arg, e))?;
            file.write_all(text.as_bytes())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", file_arg, e))?;
            file.flush().await?;
        } else {
            tokio::fs::write(&path, text)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", file_arg, e))?;
        }

        Ok(format!("File written successfully to {}.", file_arg))
    }
}

/// List the entries of a directory.
pub struct ListDirectory;

#[async_trait]
impl Tool for ListDirectory {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List files and directories in a specified folder. Directories are suffixed with '/'."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "dir_path": {
                    "type": "string",
                    "description": "Subdirectory to list (default: '.')"
                }
            }
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let dir_arg = args["dir_path"].as_str().unwrap_or(".");
        let dir = resolve_path(workspace, "dir_path", dir_arg)?;

        if !dir.is_dir() {
            return Err(anyhow::anyhow!("Not a directory: {}", dir_arg));
        }

        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list {}: {}", dir_arg, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let mut name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                name.push('/');
            }
            entries.push(name);
        }

        if entries.is_empty() {
            return Ok(format!("No files found in directory {}", dir_arg));
        }

        entries.sort();
        Ok(truncate_output(entries.join("\n"), MAX_OUTPUT_LEN))
    }
}

/// Recursively find files whose name matches a glob.
pub struct FileSearch;

#[async_trait]
impl Tool for FileSearch {
    fn name(&self) -> &str {
        "file_search"
    }

    fn description(&self) -> &str {
        "Recursively search for files in a subdirectory that match the glob pattern (e.g. '*.txt'). Returns paths relative to the root directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "dir_path": {
                    "type": "string",
                    "description": "Subdirectory to search in (default: '.')"
                },
                "pattern": {
                    "type": "string",
                    "description": "Unix shell glob to match file names against"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let pattern_arg = required_str(&args, "pattern")?;
        let dir_arg = args["dir_path"].as_str().unwrap_or(".");
        let dir = resolve_path(workspace, "dir_path", dir_arg)?;

        if !dir.is_dir() {
            return Err(anyhow::anyhow!("Not a directory: {}", dir_arg));
        }

        let pattern = glob::Pattern::new(pattern_arg)
            .map_err(|e| anyhow::anyhow!("Invalid pattern {}: {}", pattern_arg, e))?;

        let matches: Vec<PathBuf> = tokio::task::spawn_blocking(move || {
            walkdir::WalkDir::new(&dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| pattern.matches(&e.file_name().to_string_lossy()))
                .map(|e| e.into_path())
                .collect()
        })
        .await?;

        if matches.is_empty() {
            return Ok(format!(
                "No files found for pattern {} in directory {}",
                pattern_arg, dir_arg
            ));
        }

        let mut found: Vec<String> = matches
            .iter()
            .map(|p| display_relative(workspace, p))
            .collect();
        found.sort();

        Ok(truncate_output(found.join("\n"), MAX_OUTPUT_LEN))
    }
}

/// Delete a file or an empty directory.
pub struct DeleteFile;

#[async_trait]
impl Tool for DeleteFile {
    fn name(&self) -> &str {
        "file_delete"
    }

    fn description(&self) -> &str {
        "Delete a file (or an empty directory)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to delete"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_arg = required_str(&args, "file_path")?;
        let path = resolve_entry(workspace, "file_path", file_arg)?;

        if path == workspace {
            return Err(anyhow::anyhow!("Refusing to delete the root directory"));
        }

        let metadata = tokio::fs::symlink_metadata(&path)
            .await
            .map_err(|_| anyhow::anyhow!("No such file or directory: {}", file_arg))?;

        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        removed.map_err(|e| anyhow::anyhow!("Failed to delete {}: {}", file_arg, e))?;

        Ok(format!("File deleted successfully: {}.", file_arg))
    }
}
