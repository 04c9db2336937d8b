//! Interactive prompts
//!
//! Commands talk to the user through [`Prompter`] so flows can run against
//! scripted answers in tests.

use crate::error::{DdgError, Result};
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

/// Source of interactive answers
pub trait Prompter {
    /// Free-form line of text, optionally pre-filled
    fn input(&self, message: &str, initial: Option<&str>) -> Result<String>;

    /// Yes/no question
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Pick one of `items`, returning its index
    fn select(&self, message: &str, items: &[String]) -> Result<usize>;

    /// Non-blank line of text, re-asking until one is given
    fn required_input(&self, message: &str, initial: Option<&str>) -> Result<String> {
        loop {
            let answer = self.input(message, initial)?;
            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
        }
    }
}

/// Prompts on the controlling terminal with dialoguer
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn input(&self, message: &str, initial: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true);
        if let Some(initial) = initial {
            input = input.with_initial_text(initial);
        }
        input
            .interact_text()
            .map_err(|e| DdgError::prompt(message, e))
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|e| DdgError::prompt(message, e))
    }

    fn select(&self, message: &str, items: &[String]) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(items)
            .default(0)
            .interact()
            .map_err(|e| DdgError::prompt(message, e))
    }
}

#[cfg(test)]
pub use scripted::ScriptedPrompter;
