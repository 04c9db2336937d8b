//! Changing the inbox that aliases forward to

use crate::{
    core::{
        api::{ALIAS_DOMAIN, AUTHENTICATED, DuckClient},
        auth::{Authenticator, Session},
        settings::SettingsStore,
    },
    error::{DdgError, Result},
    ui::{Prompter, output},
};
use tracing::{info, instrument};

/// Reject obviously unusable forwarding targets
pub fn validate_forwarding_address(email: &str) -> Result<String> {
    let email = email.trim();
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| DdgError::validation(format!("'{email}' is not an email address")))?;

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(' ') {
        return Err(DdgError::validation(format!("'{email}' is not an email address")));
    }
    if domain.eq_ignore_ascii_case(ALIAS_DOMAIN) {
        return Err(DdgError::validation(
            "aliases cannot forward to another duck.com address",
        ));
    }
    Ok(email.to_string())
}

/// Confirm ownership of a new inbox and switch forwarding to it
pub struct ForwardingChange<'a> {
    client: &'a DuckClient,
    store: &'a SettingsStore,
    prompter: &'a dyn Prompter,
}

impl<'a> ForwardingChange<'a> {
    pub fn new(client: &'a DuckClient, store: &'a SettingsStore, prompter: &'a dyn Prompter) -> Self {
        Self {
            client,
            store,
            prompter,
        }
    }

    /// Log in, confirm `new_address` with the passcode sent to it, then
    /// switch forwarding and cache the new address.
    #[instrument(skip(self))]
    pub fn run(&self, username: &str, new_address: Option<&str>) -> Result<String> {
        let given = new_address.map(validate_forwarding_address).transpose()?;

        let auth = Authenticator::new(self.client, self.store, self.prompter);
        let session = auth.login(username)?;

        let email = match given {
            Some(email) => email,
            None => loop {
                let answer = self
                    .prompter
                    .required_input("New forwarding address", None)?;
                match validate_forwarding_address(&answer) {
                    Ok(email) => break email,
                    Err(e) => output::warning(&e.to_string()),
                }
            },
        };

        self.confirm_and_switch(&auth, &session, &email)?;

        let cached = email.clone();
        self.store.update(move |s| s.forwarding_address = cached)?;
        info!("Forwarding address changed");
        Ok(email)
    }

    fn confirm_and_switch(&self, auth: &Authenticator<'_>, session: &Session, email: &str) -> Result<()> {
        self.client.request_confirm_link(email, &session.login_token)?;
        output::info(&format!("A passcode was sent to {email}."));

        let otp = auth.prompt_otp("Enter the passcode sent to the new address")?;

        let confirmation = self.client.confirm(email, &otp.wire(), &session.login_token)?;
        if confirmation.status.as_deref() != Some(AUTHENTICATED) {
            return Err(DdgError::authentication(
                confirmation
                    .error
                    .unwrap_or_else(|| format!("could not confirm {email} (invalid passcode)")),
            ));
        }

        self.client
            .change_forwarding_address(email, &session.login_token)
    }
}
