//! Passcode login
//!
//! The service emails a four-word one-time passcode. Exchanging it at
//! `/auth/login` yields a short-lived login token, and the dashboard fetched
//! with that token carries the long-lived access token used to generate
//! aliases. The username and access token are cached in the settings file.

use crate::{
    core::{
        api::{AUTHENTICATED, DashboardResponse, DuckClient},
        settings::SettingsStore,
    },
    error::{DdgError, Result},
    ui::{Prompter, output},
};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// Number of words in a passcode
pub const OTP_WORDS: usize = 4;

/// A passcode as typed by the user: exactly four space-separated words
#[derive(Clone, PartialEq, Eq)]
pub struct Otp {
    words: Vec<String>,
}

impl Otp {
    /// Accept only input that splits into exactly four words on single
    /// spaces after trimming.
    pub fn parse(input: &str) -> Result<Self> {
        let words: Vec<&str> = input.trim().split(' ').collect();
        if words.len() != OTP_WORDS || words.iter().any(|w| w.is_empty()) {
            return Err(DdgError::validation(format!(
                "a passcode is {OTP_WORDS} words separated by single spaces"
            )));
        }
        Ok(Self {
            words: words.into_iter().map(str::to_string).collect(),
        })
    }

    /// Query-string form: words joined with `+`
    pub fn wire(&self) -> String {
        self.words.join("+")
    }
}

impl FromStr for Otp {
    type Err = DdgError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// Passcodes are credentials; keep them out of debug output and logs.
impl fmt::Debug for Otp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Otp(****)")
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub login_token: String,
    pub dashboard: DashboardResponse,
}

impl Session {
    pub fn access_token(&self) -> &str {
        &self.dashboard.user.access_token
    }
}

/// Runs the passcode flow and caches its results
pub struct Authenticator<'a> {
    client: &'a DuckClient,
    store: &'a SettingsStore,
    prompter: &'a dyn Prompter,
}

impl<'a> Authenticator<'a> {
    pub fn new(client: &'a DuckClient, store: &'a SettingsStore, prompter: &'a dyn Prompter) -> Self {
        Self {
            client,
            store,
            prompter,
        }
    }

    /// Ask for a passcode until a well-formed one is entered
    pub fn prompt_otp(&self, message: &str) -> Result<Otp> {
        loop {
            let answer = self.prompter.input(message, None)?;
            match Otp::parse(&answer) {
                Ok(otp) => return Ok(otp),
                Err(e) => output::warning(&e.to_string()),
            }
        }
    }

    /// `--username` if given, otherwise ask (pre-filled with the cached
    /// name). The answer is cached.
    #[instrument(skip(self))]
    pub fn resolve_username(&self, flag: Option<&str>) -> Result<String> {
        if let Some(username) = flag.map(str::trim).filter(|u| !u.is_empty()) {
            return Ok(username.to_string());
        }

        let cached = self.store.get_all()?.username;
        let initial = Some(cached.as_str()).filter(|c| !c.is_empty());
        let username = self
            .prompter
            .required_input("Enter your duck.com username", initial)?;

        self.store.update(|s| s.username = username.clone())?;
        Ok(username)
    }

    /// Full login for `username`: email a passcode, exchange it, fetch the
    /// dashboard and cache the access token.
    #[instrument(skip(self))]
    pub fn login(&self, username: &str) -> Result<Session> {
        self.client.request_login_link(username)?;
        output::info(
            "Check your email for a passcode from DuckDuckGo. It is never sent to anyone else.",
        );

        let otp = self.prompt_otp("Enter passcode")?;

        let spinner = output::spinner("Authenticating...");
        let session = self.exchange(username, &otp);
        match &session {
            Ok(_) => output::spinner_success(&spinner, "Successfully authenticated!"),
            Err(e) => output::spinner_fail(&spinner, &e.to_string()),
        }
        let session = session?;

        let email = session.dashboard.user.email.clone();
        let access_token = session.access_token().to_string();
        let name = username.to_string();
        self.store.update(move |s| {
            s.username = name;
            s.access_token = access_token;
            if !email.is_empty() {
                s.forwarding_address = email;
            }
        })?;
        info!("Cached username and access token for {}", username);

        Ok(session)
    }

    fn exchange(&self, username: &str, otp: &Otp) -> Result<Session> {
        let login = self.client.login(username, &otp.wire())?;

        if login.status.as_deref() != Some(AUTHENTICATED) {
            warn!("Login rejected with status {:?}", login.status);
            return Err(DdgError::authentication(
                login.error.unwrap_or_else(|| "Invalid passcode".to_string()),
            ));
        }
        let login_token = login
            .token
            .ok_or_else(|| DdgError::authentication("login response carried no token"))?;

        let dashboard = self.client.dashboard(&login_token)?;
        debug!("Dashboard reports {} generated addresses", dashboard.stats.addresses_generated);

        Ok(Session {
            username: username.to_string(),
            login_token,
            dashboard,
        })
    }

    /// Access token from `--accessToken`, the cache, or a fresh login
    #[instrument(skip(self, token_flag))]
    pub fn access_token(&self, token_flag: Option<&str>, username_flag: Option<&str>) -> Result<String> {
        if let Some(token) = token_flag.map(str::trim).filter(|t| !t.is_empty()) {
            debug!("Using access token from the command line");
            return Ok(token.to_string());
        }

        if let Some(token) = self.store.get_all()?.access_token() {
            debug!("Using cached access token");
            return Ok(token.to_string());
        }

        output::info("No access token cached, logging in.");
        let username = self.resolve_username(username_flag)?;
        let session = self.login(&username)?;
        Ok(session.access_token().to_string())
    }
}
