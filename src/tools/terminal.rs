//! Shell command execution tool.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::{truncate_output, Tool, MAX_OUTPUT_LEN};

/// Run shell commands in the root directory.
pub struct Terminal;

#[async_trait]
impl Tool for Terminal {
    fn name(&self) -> &str {
        "terminal"
    }

    fn description(&self) -> &str {
        "Run shell commands on this machine. The working directory is the root directory of the request. Returns the exit code, stdout and stderr."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "commands": {
                    "anyOf": [
                        {"type": "string"},
                        {"type": "array", "items": {"type": "string"}}
                    ],
                    "description": "List of shell commands to run. Deserialized using json.loads"
                },
                "timeout_secs": {
                    "type": "integer",
                    "description": "Optional timeout in seconds. Commands run until completion when omitted."
                }
            },
            "required": ["commands"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let command = command_line(&args["commands"])?;
        let timeout_secs = args["timeout_secs"].as_u64();

        tracing::info!("Executing command: {}", command);

        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg)
            .arg(&command)
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down everything the shell started.
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to execute command: {}", e))?;
        let pid = child.id();
        let run = child.wait_with_output();

        let output = match timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), run).await {
                Ok(output) => output,
                Err(_) => {
                    kill_process_group(pid);
                    return Err(anyhow::anyhow!("Command timed out after {} seconds", secs));
                }
            },
            None => run.await,
        }
        .map_err(|e| anyhow::anyhow!("Failed to execute command: {}", e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut result = format!("Exit code: {}\n", exit_code);

        if !stdout.is_empty() {
            result.push_str("\n--- stdout ---\n");
            result.push_str(&stdout);
        }

        if !stderr.is_empty() {
            result.push_str("\n--- stderr ---\n");
            result.push_str(&stderr);
        }

        Ok(truncate_output(result, MAX_OUTPUT_LEN))
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers; a negative pid targets the group.
    let rc = unsafe { libc::kill(-pid, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!("Process group {} already gone", pid);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Join the `commands` argument into a single shell line.
fn command_line(commands: &Value) -> anyhow::Result<String> {
    match commands {
        Value::String(s) if !s.trim().is_empty() => {
            // Models sometimes send a JSON-encoded list as a string.
            match serde_json::from_str::<Vec<String>>(s) {
                Ok(list) if !list.is_empty() => Ok(list.join(";")),
                _ => Ok(s.clone()),
            }
        }
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            if parts.is_empty() {
                Err(anyhow::anyhow!("'commands' must not be empty"))
            } else {
                Ok(parts.join(";"))
            }
        }
        _ => Err(anyhow::anyhow!("Missing 'commands' argument")),
    }
}
