//! Command execution.

use std::process::{Command, Stdio};

use dzsync_renderer::RenderedCommand;

use crate::error::SyncError;

/// Runs one rendered command to completion.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &RenderedCommand) -> Result<(), SyncError>;
}

/// Executes commands as child processes.
///
/// With `stream_output` the child inherits stdout/stderr; otherwise output is
/// captured and logged at debug level (stderr at warn on failure).
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    fn execute(&self, command: &RenderedCommand) -> Result<(), SyncError> {
        let mut process = Command::new(&command.program);
        process.args(&command.args).envs(&command.environment);

        tracing::info!(name = %command.name, command = %command.command_line(), "executing command");

        let failed = |reason: String| SyncError::CommandExecution {
            name: command.name.clone(),
            reason,
        };

        if command.stream_output {
            let status = process
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(|e| failed(format!("failed to start {}: {e}", command.program)))?;
            if !status.success() {
                return Err(failed(format!("exited with {status}")));
            }
            return Ok(());
        }

        let output = process
            .stdin(Stdio::null())
            .output()
            .map_err(|e| failed(format!("failed to start {}: {e}", command.program)))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            tracing::debug!(name = %command.name, stdout = %stdout.trim(), "command stdout");
        }

        if !output.status.success() {
            if !stderr.trim().is_empty() {
                tracing::warn!(name = %command.name, stderr = %stderr.trim(), "command stderr");
            }
            return Err(failed(format!("exited with {}", output.status)));
        }
        if !stderr.trim().is_empty() {
            tracing::debug!(name = %command.name, stderr = %stderr.trim(), "command stderr");
        }
        Ok(())
    }
}
