//! User-facing terminal layer
//!
//! Output helpers and the prompt abstraction used by command flows.

pub mod output;
pub mod prompt;

pub use prompt::{Prompter, TerminalPrompter};
