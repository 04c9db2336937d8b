//! # ddgmail
//!
//! An unofficial command-line client for DuckDuckGo Email Protection.
//! Logs in with an emailed one-time passcode, generates `@duck.com` alias
//! addresses and keeps a local log of them, and manages the account
//! waitlist.
//!
//! ## Features
//!
//! - Passcode login with a cached access token
//! - Alias generation with categories and a local alias log
//! - Waitlist join, status check and invite code claim
//! - Forwarding address changes
//! - A JSON settings file with atomic writes and schema validation
//!
//! ## Example
//!
//! ```no_run
//! use ddgmail::core::{AliasBook, DuckClient, SettingsStore};
//!
//! let client = DuckClient::new(ddgmail::core::api::DEFAULT_API_URL)?;
//! let store = SettingsStore::open(SettingsStore::default_path()?);
//! let token = store.get_all()?.access_token;
//! let alias = AliasBook::new(&store).generate(&client, &token, "shopping")?;
//! println!("{}", alias.address);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod ui;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with appropriate verbosity. `RUST_LOG` wins when set.
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
