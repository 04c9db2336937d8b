//! Error types for ddgmail
//!
//! Provides structured error handling with context and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the client
#[derive(Error, Debug)]
pub enum DdgError {
    /// The remote API answered with an error or an unexpected payload
    #[error("API error on {endpoint}: {message}")]
    Api { endpoint: String, message: String },

    /// The OTP exchange or dashboard lookup did not authenticate the user
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Transport-level failures
    #[error("HTTP request to {endpoint} failed")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The settings file exists but does not match the expected schema
    #[error("Settings error in {path}: {message}")]
    Settings {
        message: String,
        path: PathBuf,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// File system operation errors
    #[error("File system error: {operation} failed on {path}")]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Interactive prompt failures (closed stdin, no terminal, ...)
    #[error("Prompt failed: {message}")]
    Prompt {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Copying to the system clipboard failed
    #[error("Clipboard error: {message}")]
    Clipboard { message: String },

    /// Process execution errors
    #[error("Process error: {command} failed")]
    Process {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Waitlist state does not allow the requested operation
    #[error("Waitlist error: {message}")]
    Waitlist { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl DdgError {
    /// Create a new API error
    pub fn api(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a new HTTP transport error
    pub fn http(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Create a new settings error
    pub fn settings<P: Into<PathBuf>>(
        message: impl Into<String>,
        path: P,
        source: Option<serde_json::Error>,
    ) -> Self {
        Self::Settings {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new file system error
    pub fn file_system<P: Into<PathBuf>>(
        operation: impl Into<String>,
        path: P,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new prompt error
    pub fn prompt<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Prompt {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new clipboard error
    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::Clipboard {
            message: message.into(),
        }
    }

    /// Create a new process error
    pub fn process(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Process {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create a new waitlist error
    pub fn waitlist(message: impl Into<String>) -> Self {
        Self::Waitlist {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DdgError>;
