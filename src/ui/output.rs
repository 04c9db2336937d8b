//! Terminal output: alerts, spinners and tables

use crate::core::settings::{GeneratedEmail, Settings};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print a success line
pub fn success(msg: &str) {
    println!("  {} {}", "✔".green().bold(), msg);
}

/// Print an informational line
pub fn info(msg: &str) {
    println!("  {} {}", "ℹ".blue().bold(), msg);
}

/// Print a warning line
pub fn warning(msg: &str) {
    eprintln!("  {} {}", "⚠".yellow().bold(), msg);
}

/// Print an error line
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✖".red().bold(), msg.red());
}

/// Start a spinner. It stays hidden when stderr is not a terminal.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("  {spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✔"]);
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Stop a spinner and print a success line in its place
pub fn spinner_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    success(msg);
}

/// Stop a spinner and print an error line in its place
pub fn spinner_fail(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    error(msg);
}

/// Build the alias log table
pub fn emails_table(emails: &[GeneratedEmail]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Address", "Category"]);

    for (i, email) in emails.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            email.address.clone(),
            email.category.clone(),
        ]);
    }
    table
}

/// Print the alias log, or a hint when it is empty
pub fn print_emails(emails: &[GeneratedEmail]) {
    if emails.is_empty() {
        println!("  {}", "No generated addresses.".dimmed());
        return;
    }
    println!("{}", emails_table(emails));
}

/// Build a key/value table of every setting. Tokens are masked.
pub fn settings_table(settings: &Settings) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Key", "Value"]);

    let emails = format!("{} entries", settings.generated_emails.len());
    let timestamp = settings.waitlist.timestamp.to_string();
    let rows: [(&str, String); 8] = [
        ("username", or_unset(&settings.username)),
        ("accessToken", mask(&settings.access_token)),
        ("forwardingAddress", or_unset(&settings.forwarding_address)),
        ("generatedEmails", emails),
        ("amountGenerated", settings.amount_generated.to_string()),
        ("waitlist.timestamp", timestamp),
        ("waitlist.token", mask(&settings.waitlist.token)),
        ("waitlist.code", or_unset(&settings.waitlist.code)),
    ];

    for (key, value) in rows {
        table.add_row(vec![key.to_string(), value]);
    }
    table
}

fn or_unset(value: &str) -> String {
    if value.is_empty() {
        "(not set)".to_string()
    } else {
        value.to_string()
    }
}

/// Keep the first and last four characters of long secrets
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        n if n > 8 => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}...{tail}")
        }
        _ => "***".to_string(),
    }
}
