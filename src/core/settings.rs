//! Local settings file
//!
//! A single JSON document holding the cached account handle, access token,
//! the log of generated aliases and waitlist state. The document is read and
//! rewritten in full on every access; rewrites replace the file atomically
//! and every read is validated against [`Settings`].

use crate::{
    error::{DdgError, Result},
    utils::fs::FileSystemUtils,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Directory under the per-OS config dir
pub const APP_DIR: &str = "ddgmail";

/// File name of the settings document
pub const SETTINGS_FILE: &str = "settings.json";

/// Top-level keys, in file order
pub const SETTINGS_KEYS: &[&str] = &[
    "username",
    "accessToken",
    "forwardingAddress",
    "generatedEmails",
    "amountGenerated",
    "waitlist",
];

/// Keys addressable below `waitlist.`
pub const WAITLIST_KEYS: &[&str] = &["timestamp", "token", "code"];

/// The persisted settings record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Cached duck.com account handle
    pub username: String,
    /// Cached bearer token for alias generation
    pub access_token: String,
    /// Inbox the aliases forward to, as last reported by the dashboard
    pub forwarding_address: String,
    /// Local log of created aliases
    pub generated_emails: Vec<GeneratedEmail>,
    /// Number of aliases created through this tool
    pub amount_generated: u64,
    /// Waitlist state
    pub waitlist: Waitlist,
}

/// One entry of the alias log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedEmail {
    pub category: String,
    pub address: String,
}

/// Waitlist state echoed by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Waitlist {
    pub timestamp: i64,
    pub token: String,
    pub code: String,
}

impl Settings {
    /// Cached access token, if any
    pub fn access_token(&self) -> Option<&str> {
        Some(self.access_token.as_str()).filter(|t| !t.trim().is_empty())
    }
}

impl Waitlist {
    /// Whether `join` has stored both a timestamp and a claim token
    pub fn is_joined(&self) -> bool {
        self.timestamp != 0 && !self.token.is_empty()
    }
}

/// A validated settings key: a top-level key or `waitlist.<field>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsKey<'a> {
    top: &'a str,
    sub: Option<&'a str>,
}

impl<'a> SettingsKey<'a> {
    /// Parse and validate a key such as `accessToken` or `waitlist.code`
    pub fn parse(key: &'a str) -> Result<Self> {
        let key = key.trim();
        let (top, sub) = match key.split_once('.') {
            Some((top, sub)) => (top, Some(sub)),
            None => (key, None),
        };

        if !SETTINGS_KEYS.contains(&top) {
            return Err(DdgError::validation(format!(
                "unknown settings key '{key}' (expected one of: {})",
                SETTINGS_KEYS.join(", ")
            )));
        }

        if let Some(sub) = sub {
            if top != "waitlist" || !WAITLIST_KEYS.contains(&sub) {
                return Err(DdgError::validation(format!(
                    "unknown settings key '{key}' (only waitlist.{} are nested)",
                    WAITLIST_KEYS.join("|")
                )));
            }
        }

        Ok(Self { top, sub })
    }

    fn lookup<'v>(&self, doc: &'v Value) -> Option<&'v Value> {
        let value = doc.get(self.top)?;
        match self.sub {
            Some(sub) => value.get(sub),
            None => Some(value),
        }
    }

    fn lookup_mut<'v>(&self, doc: &'v mut Value) -> Option<&'v mut Value> {
        let value = doc.get_mut(self.top)?;
        match self.sub {
            Some(sub) => value.get_mut(sub),
            None => Some(value),
        }
    }
}

impl std::fmt::Display for SettingsKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sub {
            Some(sub) => write!(f, "{}.{}", self.top, sub),
            None => f.write_str(self.top),
        }
    }
}

/// Read-modify-write access to the settings file
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    fs_utils: FileSystemUtils,
}

impl SettingsStore {
    /// Open the store at `path`. Nothing touches the disk until first access.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            fs_utils: FileSystemUtils::new(),
        }
    }

    /// `<config dir>/ddgmail/settings.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdgError::validation("cannot determine the user config directory"))?;
        Ok(config_dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every setting, creating the file with defaults if it is missing
    #[instrument(skip(self))]
    pub fn get_all(&self) -> Result<Settings> {
        if self.create_if_missing()? {
            return Ok(Settings::default());
        }
        self.read()
    }

    /// Value of one key as JSON
    #[instrument(skip(self))]
    pub fn get(&self, key: &str) -> Result<Value> {
        let key = SettingsKey::parse(key)?;
        let doc = self.to_document(&self.get_all()?)?;
        key.lookup(&doc)
            .cloned()
            .ok_or_else(|| DdgError::validation(format!("settings key '{key}' is not set")))
    }

    /// Replace one key. The resulting document must still match the schema,
    /// otherwise the file is left untouched.
    #[instrument(skip(self, value))]
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let key = SettingsKey::parse(key)?;
        let mut doc = self.to_document(&self.get_all()?)?;

        let slot = key
            .lookup_mut(&mut doc)
            .ok_or_else(|| DdgError::validation(format!("settings key '{key}' is not set")))?;
        *slot = value;

        let settings: Settings = serde_json::from_value(doc).map_err(|e| {
            DdgError::validation(format!("invalid value for '{key}': {e}"))
        })?;

        self.save(&settings)?;
        debug!("Updated settings key {}", key);
        Ok(())
    }

    /// Restore one key to its default value and return that value
    #[instrument(skip(self))]
    pub fn delete(&self, key: &str) -> Result<Value> {
        let parsed = SettingsKey::parse(key)?;
        let defaults = self.to_document(&Settings::default())?;
        let value = parsed
            .lookup(&defaults)
            .cloned()
            .ok_or_else(|| DdgError::validation(format!("settings key '{parsed}' has no default")))?;

        self.set(key, value.clone())?;
        Ok(value)
    }

    /// Typed read-modify-write
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Settings) -> T,
    {
        let mut settings = self.get_all()?;
        let out = f(&mut settings);
        self.save(&settings)?;
        Ok(out)
    }

    /// Overwrite the file with defaults
    #[instrument(skip(self))]
    pub fn reset(&self) -> Result<()> {
        info!("Resetting settings file {}", self.path.display());
        self.save(&Settings::default())
    }

    /// Atomically write the whole record
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let mut content = self.render(settings)?;
        content.push('\n');

        self.fs_utils
            .write_file_atomic(&self.path, content.as_bytes())
            .map_err(|e| DdgError::file_system("write", &self.path, e))
    }

    /// Returns true when the file had to be created
    fn create_if_missing(&self) -> Result<bool> {
        if self.fs_utils.is_file(&self.path) {
            return Ok(false);
        }
        if self.fs_utils.is_dir(&self.path) {
            return Err(DdgError::settings(
                "settings path is a directory",
                &self.path,
                None,
            ));
        }

        info!(
            "Settings file not found. Creating {}",
            self.path.display()
        );
        self.save(&Settings::default())?;
        Ok(true)
    }

    fn read(&self) -> Result<Settings> {
        let content = self
            .fs_utils
            .read_file_to_string(&self.path)
            .map_err(|e| DdgError::file_system("read", &self.path, e))?;

        let doc: Value = serde_json::from_str(&content).map_err(|e| {
            DdgError::settings("file is not valid JSON", &self.path, Some(e))
        })?;

        if !doc.is_object() {
            return Err(DdgError::settings(
                "top-level value must be a JSON object",
                &self.path,
                None,
            ));
        }

        serde_json::from_value(doc).map_err(|e| {
            DdgError::settings("file does not match the settings schema", &self.path, Some(e))
        })
    }

    fn to_document(&self, settings: &Settings) -> Result<Value> {
        serde_json::to_value(settings)
            .map_err(|e| DdgError::settings("cannot serialize settings", &self.path, Some(e)))
    }

    /// Pretty JSON with 4-space indentation
    fn render(&self, settings: &Settings) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        settings
            .serialize(&mut ser)
            .map_err(|e| DdgError::settings("cannot serialize settings", &self.path, Some(e)))?;
        String::from_utf8(buf)
            .map_err(|_| DdgError::settings("serialized settings are not UTF-8", &self.path, None))
    }
}
