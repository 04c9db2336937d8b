//! Command-line argument parsing

use crate::core::api::DEFAULT_API_URL;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// ddgmail - an unofficial CLI for DuckDuckGo Email Protection
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "ddgmail", disable_version_flag = true)]
pub struct Args {
    /// Print CLI version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: (),

    /// Print debug info
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Username of the duck.com account
    #[arg(short = 'u', long, global = true, env = "DDGMAIL_USERNAME")]
    pub username: Option<String>,

    /// Access token of the duck.com account
    #[arg(
        short = 't',
        long = "access-token",
        visible_alias = "accessToken",
        global = true,
        env = "DDGMAIL_ACCESS_TOKEN",
        hide_env_values = true
    )]
    pub access_token: Option<String>,

    /// Don't copy generated addresses or tokens to the clipboard
    #[arg(
        short = 'n',
        long = "no-clipboard",
        visible_alias = "noClipboard",
        global = true
    )]
    pub no_clipboard: bool,

    /// Category for new addresses, or the category to filter by
    #[arg(short = 'c', long, global = true)]
    pub category: Option<String>,

    /// Settings file to use instead of the per-user default
    #[arg(long, global = true, env = "DDGMAIL_SETTINGS", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true, env = "DDGMAIL_API_URL", default_value = DEFAULT_API_URL, hide = true)]
    pub api_url: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in with an emailed passcode and cache the access token
    Auth,

    /// Generate a new @duck.com address
    New,

    /// Show how many addresses were generated
    Amount,

    /// Print the access token
    Access,

    /// List generated addresses (filtered by --category if given)
    Emails,

    /// Move a generated address to another category
    CategoryChange {
        /// Address to recategorize (prompted if omitted)
        address: Option<String>,
        /// New category (defaults to --category, prompted if omitted)
        category: Option<String>,
    },

    /// List generated addresses in one category
    CategorySearch {
        /// Category to search (defaults to --category, prompted if omitted)
        category: Option<String>,
    },

    /// Remove an address from the local log
    EmailDelete {
        /// Address to remove (picked from the log if omitted)
        address: Option<String>,
    },

    /// Change the inbox your addresses forward to
    ChangeForwardingAddress {
        /// New forwarding address (prompted if omitted)
        email: Option<String>,
    },

    /// Print the settings file location
    Config,

    /// Print one setting
    ConfigGet {
        /// Setting key, e.g. `username` or `waitlist.code`
        key: String,
    },

    /// Change one setting (JSON values are parsed, anything else is a string)
    ConfigSet {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },

    /// Restore every setting to its default
    ConfigReset {
        /// Don't ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show every setting as a table
    ConfigTable,

    /// Restore one setting to its default
    ConfigDelete {
        /// Setting key
        key: String,
    },

    /// Join the waitlist
    Join,

    /// Check whether you can claim an invite code
    Check,

    /// Claim an invite code
    GetCode,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}
