//! Runtime configuration
//!
//! Resolves command-line flags and environment overrides into the values
//! every command needs, and validates them before anything runs.

use crate::{cli::Args, core::settings::SettingsStore, error::DdgError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    /// API base URL
    pub api_url: String,
    /// Settings file location
    pub settings_path: PathBuf,
    /// Username given with `--username`
    pub username: Option<String>,
    /// Access token given with `--accessToken`
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Copy results to the clipboard
    pub clipboard: bool,
    /// Category given with `--category`
    pub category: Option<String>,
}

impl Config {
    /// Create configuration from command line arguments
    pub fn from_args(args: &Args) -> Result<Self, DdgError> {
        let settings_path = match &args.settings {
            Some(path) => path.clone(),
            None => SettingsStore::default_path()?,
        };

        let config = Self {
            debug: args.debug,
            api_url: args.api_url.trim().trim_end_matches('/').to_string(),
            settings_path,
            username: non_blank(args.username.as_deref()),
            access_token: non_blank(args.access_token.as_deref()),
            clipboard: !args.no_clipboard,
            category: non_blank(args.category.as_deref()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), DdgError> {
        let url = Url::parse(&self.api_url).map_err(|e| {
            DdgError::validation(format!("invalid API URL '{}': {e}", self.api_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DdgError::validation(format!(
                "API URL must use http or https: {}",
                self.api_url
            )));
        }

        if self.settings_path.is_dir() {
            return Err(DdgError::validation(format!(
                "settings path is a directory: {}",
                self.settings_path.display()
            )));
        }

        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
