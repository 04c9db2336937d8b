//! Process execution utilities
//!
//! Runs helper programs (clipboard tools) with piped stdin and captured stderr.

use crate::error::{DdgError, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, instrument};

#[cfg(windows)]
const LOOKUP_COMMAND: &str = "where";
#[cfg(not(windows))]
const LOOKUP_COMMAND: &str = "which";

/// Utility for running external processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new process runner
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Run a command, feeding `input` on stdin, and wait for it to exit
    #[instrument(skip(self, input))]
    pub fn run_with_stdin(&self, command: &str, args: &[&str], input: &[u8]) -> Result<()> {
        let cmd_str = format!("{} {}", command, args.join(" "));
        debug!("Running command with stdin: {}", cmd_str);

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DdgError::process(cmd_str.clone(), None, format!("Failed to execute command: {e}"))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input).map_err(|e| {
                DdgError::process(cmd_str.clone(), None, format!("Failed to write stdin: {e}"))
            })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            DdgError::process(cmd_str.clone(), None, format!("Failed to wait for command: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            debug!("Command stderr: {}", stderr);
            return Err(DdgError::process(cmd_str, output.status.code(), stderr));
        }

        debug!("Command completed successfully");
        Ok(())
    }

    /// Check if a command exists in PATH
    #[instrument(skip(self))]
    pub fn command_exists(&self, command: &str) -> bool {
        let result = Command::new(LOOKUP_COMMAND)
            .arg(command)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match result {
            Ok(status) => {
                let exists = status.success();
                debug!("Command '{}' exists: {}", command, exists);
                exists
            }
            Err(e) => {
                debug!("Failed to check if command '{}' exists: {}", command, e);
                false
            }
        }
    }
}
