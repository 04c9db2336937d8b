//! Core client functionality
//!
//! Contains the API client, the passcode login flow, the settings store and
//! the alias, waitlist and forwarding operations built on them.

pub mod aliases;
pub mod api;
pub mod auth;
pub mod forwarding;
pub mod settings;
pub mod waitlist;

pub use aliases::AliasBook;
pub use api::DuckClient;
pub use auth::{Authenticator, Otp, Session};
pub use forwarding::ForwardingChange;
pub use settings::{GeneratedEmail, Settings, SettingsStore};
pub use waitlist::{Eligibility, JoinOutcome, WaitlistManager};
