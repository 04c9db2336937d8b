//! HTTP client for the DuckDuckGo Email Protection API
//!
//! Every operation is a single blocking request. Failures are detected from
//! the payload shape: an `error` field, a missing field, or a status string
//! other than the one the endpoint promises.

use crate::error::{DdgError, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::form_urlencoded::byte_serialize;

/// Public API base URL
pub const DEFAULT_API_URL: &str = "https://quack.duckduckgo.com/api";

/// Domain appended to generated alias names
pub const ALIAS_DOMAIN: &str = "duck.com";

/// Status returned by `/auth/login` and `/auth/confirm` on success
pub const AUTHENTICATED: &str = "authenticated";

const USER_AGENT: &str = concat!("ddgmail/", env!("CARGO_PKG_VERSION"));

/// Response of `/auth/login` and `/auth/confirm`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `/email/dashboard`
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardResponse {
    #[serde(default)]
    pub invites: Vec<serde_json::Value>,
    pub stats: Stats,
    pub user: DashboardUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stats {
    pub addresses_generated: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardUser {
    pub access_token: String,
    #[serde(default)]
    pub cohort: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
}

/// Response of `POST /email/addresses`
#[derive(Debug, Clone, Deserialize)]
pub struct AddressResponse {
    pub address: String,
}

impl AddressResponse {
    /// `<address>@duck.com`
    pub fn full_address(&self) -> String {
        full_address(&self.address)
    }
}

/// Response of `POST /auth/waitlist/join`
#[derive(Debug, Clone, Deserialize)]
pub struct WaitlistJoinResponse {
    pub timestamp: i64,
    pub token: String,
}

/// Response of `GET /auth/waitlist/status`
#[derive(Debug, Clone, Deserialize)]
pub struct WaitlistStatusResponse {
    pub timestamp: i64,
}

/// Response of `POST /auth/waitlist/code`; empty when not yet eligible
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaitlistCodeResponse {
    #[serde(default)]
    pub code: Option<String>,
}

/// Generic body for endpoints that answer `{}` or `{"error": ...}`
#[derive(Debug, Clone, Default, Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    error: Option<String>,
}

/// Append the alias domain unless already present
pub fn full_address(address: &str) -> String {
    if address.contains('@') {
        address.to_string()
    } else {
        format!("{address}@{ALIAS_DOMAIN}")
    }
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Blocking client bound to one API base URL
#[derive(Debug, Clone)]
pub struct DuckClient {
    client: Client,
    base_url: String,
}

impl DuckClient {
    /// Create a client for `base_url` (no trailing slash needed)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DdgError::http("client builder", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask the service to email a one-time passcode to `user`
    #[instrument(skip(self))]
    pub fn request_login_link(&self, user: &str) -> Result<()> {
        let path = "/auth/loginlink";
        let url = format!("{}?user={}", self.url(path), encode(user));
        let ack: Acknowledgement = self.send(path, self.client.get(url))?;
        reject_error(path, ack.error)
    }

    /// Exchange the passcode for a login token.
    ///
    /// `otp` is the wire form (`word+word+word+word`) and is placed in the
    /// query string as-is.
    #[instrument(skip(self, otp))]
    pub fn login(&self, user: &str, otp: &str) -> Result<AuthenticationResponse> {
        let path = "/auth/login";
        let url = format!("{}?otp={}&user={}", self.url(path), otp, encode(user));
        self.send(path, self.client.get(url))
    }

    /// Fetch the account dashboard with a login token
    #[instrument(skip(self, login_token))]
    pub fn dashboard(&self, login_token: &str) -> Result<DashboardResponse> {
        let path = "/email/dashboard";
        let body: serde_json::Value = self.send(path, self.client.get(self.url(path)).bearer_auth(login_token))?;
        parse_or_error(path, body)
    }

    /// Generate a new alias address
    #[instrument(skip(self, access_token))]
    pub fn create_address(&self, access_token: &str) -> Result<AddressResponse> {
        let path = "/email/addresses";
        let body: serde_json::Value =
            self.send(path, self.client.post(self.url(path)).bearer_auth(access_token))?;
        parse_or_error(path, body)
    }

    /// Join the account waitlist
    #[instrument(skip(self))]
    pub fn join_waitlist(&self) -> Result<WaitlistJoinResponse> {
        let path = "/auth/waitlist/join";
        let body: serde_json::Value = self.send(path, self.client.post(self.url(path)))?;
        parse_or_error(path, body)
    }

    /// Current waitlist position marker
    #[instrument(skip(self))]
    pub fn waitlist_status(&self) -> Result<WaitlistStatusResponse> {
        let path = "/auth/waitlist/status";
        let body: serde_json::Value = self.send(path, self.client.get(self.url(path)))?;
        parse_or_error(path, body)
    }

    /// Claim an invite code with the waitlist token
    #[instrument(skip(self, token))]
    pub fn waitlist_code(&self, token: &str) -> Result<WaitlistCodeResponse> {
        let path = "/auth/waitlist/code";
        let body: serde_json::Value = self.send(
            path,
            self.client.post(self.url(path)).form(&[("token", token)]),
        )?;
        parse_or_error(path, body)
    }

    /// Send a confirmation passcode to a prospective forwarding address
    #[instrument(skip(self, login_token))]
    pub fn request_confirm_link(&self, email: &str, login_token: &str) -> Result<()> {
        let path = "/auth/confirmlink";
        let url = format!("{}?email={}", self.url(path), encode(email));
        let ack: Acknowledgement = self.send(path, self.client.get(url).bearer_auth(login_token))?;
        reject_error(path, ack.error)
    }

    /// Confirm ownership of `email` with the passcode sent to it
    #[instrument(skip(self, otp, login_token))]
    pub fn confirm(&self, email: &str, otp: &str, login_token: &str) -> Result<AuthenticationResponse> {
        let path = "/auth/confirm";
        let url = format!("{}?email={}&otp={}", self.url(path), encode(email), otp);
        self.send(path, self.client.get(url).bearer_auth(login_token))
    }

    /// Point the account at a new forwarding address
    #[instrument(skip(self, login_token))]
    pub fn change_forwarding_address(&self, email: &str, login_token: &str) -> Result<()> {
        let path = "/email/change-email-address";
        let url = format!("{}?email={}", self.url(path), encode(email));
        let ack: Acknowledgement = self.send(path, self.client.post(url).bearer_auth(login_token))?;
        reject_error(path, ack.error)
    }

    /// Send a request and decode the JSON body whatever the HTTP status;
    /// the payload decides success.
    fn send<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().map_err(|e| DdgError::http(endpoint, e))?;
        let status = response.status();
        let text = response.text().map_err(|e| DdgError::http(endpoint, e))?;
        debug!("{} answered {} ({} bytes)", endpoint, status, text.len());

        let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            DdgError::api(endpoint, format!("unexpected response (HTTP {status}): {e}"))
        })
    }
}

/// Turn an `{"error": ...}` body into an error, otherwise decode `T`
fn parse_or_error<T: DeserializeOwned>(endpoint: &str, body: serde_json::Value) -> Result<T> {
    if let Some(error) = body.get("error").and_then(|e| e.as_str()) {
        return Err(DdgError::api(endpoint, error));
    }
    serde_json::from_value(body)
        .map_err(|e| DdgError::api(endpoint, format!("unexpected response: {e}")))
}

fn reject_error(endpoint: &str, error: Option<String>) -> Result<()> {
    match error {
        Some(message) => Err(DdgError::api(endpoint, message)),
        None => Ok(()),
    }
}
