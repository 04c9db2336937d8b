//! Command implementations for the CLI

use crate::{
    cli::Command,
    config::Config,
    core::{
        AliasBook, Authenticator, DuckClient, Eligibility, ForwardingChange, JoinOutcome,
        SettingsStore, WaitlistManager, aliases::DEFAULT_CATEGORY,
    },
    ui::{Prompter, TerminalPrompter, output},
    utils::Clipboard,
};
use anyhow::{Context as _, bail};
use chrono::DateTime;
use colored::Colorize;
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Everything a command handler needs
pub struct Context<'a> {
    pub config: &'a Config,
    pub client: DuckClient,
    pub store: SettingsStore,
    pub prompter: &'a dyn Prompter,
    pub clipboard: Clipboard,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a Config, prompter: &'a dyn Prompter) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            client: DuckClient::new(config.api_url.as_str())
                .context("Failed to create HTTP client")?,
            store: SettingsStore::open(config.settings_path.clone()),
            prompter,
            clipboard: Clipboard::new(config.clipboard),
        })
    }

    fn authenticator(&self) -> Authenticator<'_> {
        Authenticator::new(&self.client, &self.store, self.prompter)
    }

    fn aliases(&self) -> AliasBook<'_> {
        AliasBook::new(&self.store)
    }

    fn waitlist(&self) -> WaitlistManager<'_> {
        WaitlistManager::new(&self.client, &self.store, self.prompter)
    }

    fn access_token(&self) -> anyhow::Result<String> {
        self.authenticator()
            .access_token(
                self.config.access_token.as_deref(),
                self.config.username.as_deref(),
            )
            .context("Failed to obtain an access token")
    }

    /// Copy to the clipboard; failures are reported but never fatal
    fn copy(&self, text: &str, what: &str) {
        match self.clipboard.copy(text) {
            Ok(true) => output::info(&format!("Copied {what} to clipboard.")),
            Ok(false) => {}
            Err(e) => output::warning(&format!("Could not copy {what}: {e}")),
        }
    }

    /// Positional argument, else `--category`, else ask
    fn category(&self, arg: Option<&str>, message: &str) -> anyhow::Result<String> {
        if let Some(category) = arg
            .or(self.config.category.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            return Ok(category.to_string());
        }
        Ok(self.prompter.required_input(message, None)?)
    }

    /// Positional argument, else pick from the log
    fn address(&self, arg: Option<&str>, message: &str) -> anyhow::Result<String> {
        if let Some(address) = arg.map(str::trim).filter(|a| !a.is_empty()) {
            return Ok(address.to_string());
        }

        let emails = self.aliases().list(None)?;
        if emails.is_empty() {
            bail!("No generated addresses in the local log");
        }
        let items: Vec<String> = emails
            .iter()
            .map(|e| format!("{} ({})", e.address, e.category))
            .collect();
        let index = self.prompter.select(message, &items)?;
        let picked = emails
            .get(index)
            .with_context(|| format!("No address at position {index}"))?;
        Ok(picked.address.clone())
    }
}

/// Execute the appropriate command based on CLI arguments
#[instrument(skip(config, command))]
pub fn execute_command(config: &Config, command: &Command) -> anyhow::Result<()> {
    let prompter = TerminalPrompter::new();
    let ctx = Context::new(config, &prompter)?;
    run(&ctx, command)
}

/// Dispatch `command` against an already-built context
pub fn run(ctx: &Context<'_>, command: &Command) -> anyhow::Result<()> {
    debug!("Settings file: {}", ctx.store.path().display());

    match command {
        Command::Auth => execute_auth_command(ctx),
        Command::New => execute_new_command(ctx),
        Command::Amount => execute_amount_command(ctx),
        Command::Access => execute_access_command(ctx),
        Command::Emails => execute_emails_command(ctx),
        Command::CategoryChange { address, category } => {
            execute_category_change_command(ctx, address.as_deref(), category.as_deref())
        }
        Command::CategorySearch { category } => {
            execute_category_search_command(ctx, category.as_deref())
        }
        Command::EmailDelete { address } => execute_email_delete_command(ctx, address.as_deref()),
        Command::ChangeForwardingAddress { email } => {
            execute_change_forwarding_command(ctx, email.as_deref())
        }
        Command::Config => execute_config_command(ctx),
        Command::ConfigGet { key } => execute_config_get_command(ctx, key),
        Command::ConfigSet { key, value } => execute_config_set_command(ctx, key, value),
        Command::ConfigReset { yes } => execute_config_reset_command(ctx, *yes),
        Command::ConfigTable => execute_config_table_command(ctx),
        Command::ConfigDelete { key } => execute_config_delete_command(ctx, key),
        Command::Join => execute_join_command(ctx),
        Command::Check => execute_check_command(ctx),
        Command::GetCode => execute_get_code_command(ctx),
    }
}

#[instrument(skip(ctx))]
fn execute_auth_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    let auth = ctx.authenticator();
    let username = auth.resolve_username(ctx.config.username.as_deref())?;
    auth.login(&username).context("Authentication failed")?;

    output::success("Saved username & access token to the settings file.");
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_new_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    let token = ctx.access_token()?;
    let category = ctx.config.category.as_deref().unwrap_or(DEFAULT_CATEGORY);

    let spinner = output::spinner("Generating address...");
    let entry = match ctx.aliases().generate(&ctx.client, &token, category) {
        Ok(entry) => {
            output::spinner_success(&spinner, "Generated a new address!");
            entry
        }
        Err(e) => {
            output::spinner_fail(&spinner, "Could not generate an address.");
            return Err(e).context("Failed to generate address");
        }
    };

    info!("Generated address in category {}", entry.category);
    println!("{}", entry.address.bold());
    ctx.copy(&entry.address, "address");
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_amount_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    let settings = ctx.store.get_all()?;
    let has_token = ctx.config.access_token.is_some() || settings.access_token().is_some();

    if has_token {
        output::success(&format!(
            "You have generated {} address(es) with ddgmail.",
            settings.amount_generated
        ));
        return Ok(());
    }

    output::info("No access token cached, logging in again.");
    let auth = ctx.authenticator();
    let username = auth.resolve_username(ctx.config.username.as_deref())?;
    let session = auth.login(&username).context("Authentication failed")?;

    output::success(&format!(
        "Your account has generated {} address(es); {} with ddgmail.",
        session.dashboard.stats.addresses_generated, settings.amount_generated
    ));
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_access_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    let token = ctx.access_token()?;
    println!("{token}");
    ctx.copy(&token, "access token");
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_emails_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    let emails = ctx.aliases().list(ctx.config.category.as_deref())?;
    output::print_emails(&emails);
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_category_change_command(
    ctx: &Context<'_>,
    address: Option<&str>,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let address = ctx.address(address, "Address to recategorize")?;
    let category = ctx.category(category, "New category")?;

    let previous = ctx
        .aliases()
        .change_category(&address, &category)
        .context("Failed to change category")?;

    output::success(&format!(
        "Moved {address} from '{previous}' to '{}'.",
        category.trim()
    ));
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_category_search_command(ctx: &Context<'_>, category: Option<&str>) -> anyhow::Result<()> {
    let category = ctx.category(category, "Category to search")?;
    let emails = ctx.aliases().list(Some(&category))?;

    if emails.is_empty() {
        output::info(&format!("No addresses in category '{category}'."));
        return Ok(());
    }
    output::print_emails(&emails);
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_email_delete_command(ctx: &Context<'_>, address: Option<&str>) -> anyhow::Result<()> {
    let address = ctx.address(address, "Address to remove")?;
    let removed = ctx
        .aliases()
        .delete(&address)
        .context("Failed to remove address")?;

    output::success(&format!("Removed {} from the local log.", removed.address));
    output::info("The address keeps forwarding until you deactivate it on duckduckgo.com.");
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_change_forwarding_command(ctx: &Context<'_>, email: Option<&str>) -> anyhow::Result<()> {
    let username = ctx
        .authenticator()
        .resolve_username(ctx.config.username.as_deref())?;

    let email = ForwardingChange::new(&ctx.client, &ctx.store, ctx.prompter)
        .run(&username, email)
        .context("Failed to change forwarding address")?;

    output::success(&format!("Addresses now forward to {email}."));
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_config_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    ctx.store.get_all()?;
    println!("{}", ctx.store.path().display());
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_config_get_command(ctx: &Context<'_>, key: &str) -> anyhow::Result<()> {
    let value = ctx.store.get(key)?;
    println!("{}", render_value(&value)?);
    Ok(())
}

#[instrument(skip(ctx, value))]
fn execute_config_set_command(ctx: &Context<'_>, key: &str, value: &str) -> anyhow::Result<()> {
    ctx.store
        .set(key, parse_value(value))
        .with_context(|| format!("Failed to set {key}"))?;
    output::success(&format!("Updated {key}."));
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_config_reset_command(ctx: &Context<'_>, yes: bool) -> anyhow::Result<()> {
    if !yes
        && !ctx
            .prompter
            .confirm("Reset every setting, including the alias log?", false)?
    {
        output::info("Settings left unchanged.");
        return Ok(());
    }

    ctx.store.reset()?;
    output::success("Settings reset to defaults.");
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_config_table_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    let settings = ctx.store.get_all()?;
    println!("{}", output::settings_table(&settings));
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_config_delete_command(ctx: &Context<'_>, key: &str) -> anyhow::Result<()> {
    let restored = ctx
        .store
        .delete(key)
        .with_context(|| format!("Failed to delete {key}"))?;
    output::success(&format!("Restored {key} to {}.", render_value(&restored)?));
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_join_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    match ctx.waitlist().join().context("Failed to join the waitlist")? {
        JoinOutcome::Joined(_) => output::success("Successfully joined waitlist."),
        JoinOutcome::Kept(_) => output::info("Kept your existing waitlist place."),
    }
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_check_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    let spinner = output::spinner("Checking status...");
    let eligibility = ctx.waitlist().check();
    spinner.finish_and_clear();

    match eligibility? {
        Eligibility::Eligible => output::success(
            "You may be eligible to get an invite code! Use the get-code command.",
        ),
        Eligibility::NotYet { current, joined } => {
            output::error("You are not eligible to get an invite code yet.");
            output::info(&format!(
                "Joined at {}, the waitlist is at {}.",
                format_timestamp(joined),
                format_timestamp(current)
            ));
        }
    }
    Ok(())
}

#[instrument(skip(ctx))]
fn execute_get_code_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    match ctx.waitlist().get_code().context("Failed to claim an invite code")? {
        Some(code) => {
            output::success("Got an invite code! It was saved to the settings file.");
            println!("{}", code.bold());
            ctx.copy(&code, "invite code");
        }
        None => output::error("You are not eligible to get an invite code yet."),
    }
    Ok(())
}

/// `config-set` values: JSON when it parses, otherwise a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Strings print bare, everything else as pretty JSON
fn render_value(value: &Value) -> anyhow::Result<String> {
    Ok(match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other)?,
    })
}

/// Seconds since the epoch as UTC, falling back to the raw number
fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::prompt::ScriptedPrompter;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn config_for(server: &MockServer, dir: &TempDir) -> Config {
        Config {
            debug: false,
            api_url: server.base_url(),
            settings_path: dir.path().join("settings.json"),
            username: None,
            access_token: None,
            clipboard: false,
            category: None,
        }
    }

    fn mock_login(server: &MockServer, addresses_generated: u64) {
        server.mock(|when, then| {
            when.method(GET).path("/auth/loginlink").query_param("user", "quackers");
            then.status(200).json_body(json!({}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/auth/login");
            then.status(200)
                .json_body(json!({ "status": "authenticated", "token": "login-token" }));
        });
        server.mock(move |when, then| {
            when.method(GET).path("/email/dashboard");
            then.status(200).json_body(json!({
                "invites": [],
                "stats": { "addresses_generated": addresses_generated },
                "user": { "access_token": "access-token", "email": "me@example.com" }
            }));
        });
    }

    #[test]
    fn test_parse_value_prefers_json() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("{\"a\": 1}"), json!({"a": 1}));
        assert_eq!(parse_value("quackers"), json!("quackers"));
        assert_eq!(parse_value("\"7\""), json!("7"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn test_new_with_cached_token_generates_and_logs() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/email/addresses")
                .header("authorization", "Bearer cached");
            then.status(201).json_body(json!({ "address": "fresh-duck" }));
        });
        let mut config = config_for(&server, &dir);
        config.category = Some("shopping".into());
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let ctx = Context::new(&config, &prompter).unwrap();
        ctx.store.update(|s| s.access_token = "cached".into()).unwrap();

        run(&ctx, &Command::New).unwrap();

        create.assert();
        let settings = ctx.store.get_all().unwrap();
        assert_eq!(settings.amount_generated, 1);
        assert_eq!(settings.generated_emails[0].address, "fresh-duck@duck.com");
        assert_eq!(settings.generated_emails[0].category, "shopping");
    }

    #[test]
    fn test_new_without_token_logs_in_first() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        mock_login(&server, 0);
        server.mock(|when, then| {
            when.method(POST)
                .path("/email/addresses")
                .header("authorization", "Bearer access-token");
            then.status(201).json_body(json!({ "address": "fresh-duck" }));
        });
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(["quackers", "a b c d"]);
        let ctx = Context::new(&config, &prompter).unwrap();

        run(&ctx, &Command::New).unwrap();

        let settings = ctx.store.get_all().unwrap();
        assert_eq!(settings.access_token, "access-token");
        assert_eq!(settings.generated_emails[0].category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_amount_without_token_prompts_for_username_and_reauthenticates() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        mock_login(&server, 12);
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(["quackers", "grape lemon cherry melon"]);
        let ctx = Context::new(&config, &prompter).unwrap();

        run(&ctx, &Command::Amount).unwrap();

        let asked = prompter.asked();
        assert_eq!(asked.len(), 2);
        assert!(asked[0].contains("username"));
        assert_eq!(ctx.store.get_all().unwrap().access_token, "access-token");
    }

    #[test]
    fn test_amount_with_token_stays_offline() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let login = server.mock(|when, then| {
            when.method(GET).path("/auth/loginlink");
            then.status(200).json_body(json!({}));
        });
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let ctx = Context::new(&config, &prompter).unwrap();
        ctx.store.update(|s| s.access_token = "cached".into()).unwrap();

        run(&ctx, &Command::Amount).unwrap();

        login.assert_calls(0);
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_category_change_and_delete_through_commands() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(["two@duck.com (default)"]);
        let ctx = Context::new(&config, &prompter).unwrap();
        ctx.aliases().record("default", "one").unwrap();
        ctx.aliases().record("default", "two").unwrap();

        run(
            &ctx,
            &Command::CategoryChange {
                address: Some("one".into()),
                category: Some("news".into()),
            },
        )
        .unwrap();
        run(&ctx, &Command::EmailDelete { address: None }).unwrap();

        let emails = ctx.aliases().list(None).unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].address, "one@duck.com");
        assert_eq!(emails[0].category, "news");
    }

    #[test]
    fn test_category_change_unknown_address_fails() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let ctx = Context::new(&config, &prompter).unwrap();

        let result = run(
            &ctx,
            &Command::CategoryChange {
                address: Some("ghost".into()),
                category: Some("news".into()),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_email_delete_with_empty_log_fails() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let ctx = Context::new(&config, &prompter).unwrap();

        assert!(run(&ctx, &Command::EmailDelete { address: None }).is_err());
    }

    #[test]
    fn test_category_search_prompts_without_flag() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(["news"]);
        let ctx = Context::new(&config, &prompter).unwrap();

        run(&ctx, &Command::CategorySearch { category: None }).unwrap();

        assert_eq!(prompter.asked(), vec!["Category to search".to_string()]);
    }

    #[test]
    fn test_config_set_get_delete_cycle() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let ctx = Context::new(&config, &prompter).unwrap();

        run(
            &ctx,
            &Command::ConfigSet {
                key: "amountGenerated".into(),
                value: "5".into(),
            },
        )
        .unwrap();
        assert_eq!(ctx.store.get("amountGenerated").unwrap(), json!(5));

        run(
            &ctx,
            &Command::ConfigDelete {
                key: "amountGenerated".into(),
            },
        )
        .unwrap();
        assert_eq!(ctx.store.get("amountGenerated").unwrap(), json!(0));

        assert!(
            run(
                &ctx,
                &Command::ConfigSet {
                    key: "amountGenerated".into(),
                    value: "many".into(),
                },
            )
            .is_err()
        );
    }

    #[test]
    fn test_config_reset_requires_confirmation() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(["n", "y"]);
        let ctx = Context::new(&config, &prompter).unwrap();
        ctx.store.update(|s| s.username = "quackers".into()).unwrap();

        run(&ctx, &Command::ConfigReset { yes: false }).unwrap();
        assert_eq!(ctx.store.get_all().unwrap().username, "quackers");

        run(&ctx, &Command::ConfigReset { yes: false }).unwrap();
        assert!(ctx.store.get_all().unwrap().username.is_empty());
    }

    #[test]
    fn test_check_before_join_fails() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let ctx = Context::new(&config, &prompter).unwrap();

        assert!(run(&ctx, &Command::Check).is_err());
        assert!(run(&ctx, &Command::GetCode).is_err());
    }

    #[test]
    fn test_join_then_get_code() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/waitlist/join");
            then.status(200).json_body(json!({ "timestamp": 1_650_000_000, "token": "claim" }));
        });
        server.mock(|when, then| {
            when.method(POST).path("/auth/waitlist/code").body("token=claim");
            then.status(200).json_body(json!({ "code": "INVITE" }));
        });
        let config = config_for(&server, &dir);
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let ctx = Context::new(&config, &prompter).unwrap();

        run(&ctx, &Command::Join).unwrap();
        run(&ctx, &Command::GetCode).unwrap();

        assert_eq!(ctx.store.get_all().unwrap().waitlist.code, "INVITE");
    }
}
