//! System clipboard access through platform helper programs

use crate::error::{DdgError, Result};
use crate::utils::process::ProcessRunner;
use tracing::{debug, instrument};

/// Candidate helpers, tried in order
#[cfg(target_os = "macos")]
const CANDIDATES: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(windows)]
const CANDIDATES: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", windows)))]
const CANDIDATES: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Copies text to the clipboard unless disabled with `--noClipboard`
#[derive(Debug, Clone)]
pub struct Clipboard {
    enabled: bool,
    runner: ProcessRunner,
}

impl Clipboard {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            runner: ProcessRunner::new(),
        }
    }

    /// Copy `text`. Returns `Ok(false)` when copying is switched off.
    #[instrument(skip(self, text))]
    pub fn copy(&self, text: &str) -> Result<bool> {
        if !self.enabled {
            debug!("Clipboard disabled, skipping copy");
            return Ok(false);
        }

        let (command, args) = CANDIDATES
            .iter()
            .find(|(command, _)| self.runner.command_exists(command))
            .ok_or_else(|| {
                let names: Vec<&str> = CANDIDATES.iter().map(|(c, _)| *c).collect();
                DdgError::clipboard(format!("no clipboard tool found (tried {})", names.join(", ")))
            })?;

        self.runner
            .run_with_stdin(command, args, text.as_bytes())
            .map_err(|e| DdgError::clipboard(e.to_string()))?;

        debug!("Copied {} bytes with {}", text.len(), command);
        Ok(true)
    }
}
