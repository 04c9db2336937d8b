//! Account waitlist: join, poll eligibility, claim an invite code

use crate::{
    core::{
        api::DuckClient,
        settings::{SettingsStore, Waitlist},
    },
    error::{DdgError, Result},
    ui::Prompter,
};
use tracing::{debug, info, instrument};

/// Outcome of `join`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new place was stored
    Joined(Waitlist),
    /// The user chose to keep the existing place
    Kept(Waitlist),
}

/// Outcome of `check`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The service's marker has reached our join timestamp
    Eligible,
    NotYet { current: i64, joined: i64 },
}

/// Waitlist operations against the cached waitlist state
pub struct WaitlistManager<'a> {
    client: &'a DuckClient,
    store: &'a SettingsStore,
    prompter: &'a dyn Prompter,
}

impl<'a> WaitlistManager<'a> {
    pub fn new(client: &'a DuckClient, store: &'a SettingsStore, prompter: &'a dyn Prompter) -> Self {
        Self {
            client,
            store,
            prompter,
        }
    }

    /// Join the waitlist. An existing place is only replaced after the user
    /// confirms; any invite code already claimed is kept.
    #[instrument(skip(self))]
    pub fn join(&self) -> Result<JoinOutcome> {
        let current = self.store.get_all()?.waitlist;

        if current.is_joined()
            && !self.prompter.confirm(
                "You already joined the waitlist. Do you want to overwrite everything?",
                false,
            )?
        {
            debug!("Keeping existing waitlist place");
            return Ok(JoinOutcome::Kept(current));
        }

        let response = self.client.join_waitlist()?;
        let waitlist = Waitlist {
            timestamp: response.timestamp,
            token: response.token,
            code: current.code,
        };
        let stored = waitlist.clone();
        self.store.update(move |s| s.waitlist = stored)?;
        info!("Joined waitlist at {}", waitlist.timestamp);

        Ok(JoinOutcome::Joined(waitlist))
    }

    /// Compare the service's current marker with our join timestamp
    #[instrument(skip(self))]
    pub fn check(&self) -> Result<Eligibility> {
        let waitlist = self.joined()?;
        let status = self.client.waitlist_status()?;
        debug!(
            "Waitlist marker {} vs joined {}",
            status.timestamp, waitlist.timestamp
        );

        if status.timestamp >= waitlist.timestamp {
            Ok(Eligibility::Eligible)
        } else {
            Ok(Eligibility::NotYet {
                current: status.timestamp,
                joined: waitlist.timestamp,
            })
        }
    }

    /// Claim the invite code. `None` while the service has none for us.
    #[instrument(skip(self))]
    pub fn get_code(&self) -> Result<Option<String>> {
        let waitlist = self.joined()?;
        let response = self.client.waitlist_code(&waitlist.token)?;

        match response.code.filter(|c| !c.is_empty()) {
            Some(code) => {
                let stored = code.clone();
                self.store.update(move |s| s.waitlist.code = stored)?;
                info!("Stored waitlist invite code");
                Ok(Some(code))
            }
            None => Ok(None),
        }
    }

    fn joined(&self) -> Result<Waitlist> {
        let waitlist = self.store.get_all()?.waitlist;
        if !waitlist.is_joined() {
            return Err(DdgError::waitlist(
                "You haven't joined the waitlist yet. Use the join command.",
            ));
        }
        Ok(waitlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::prompt::ScriptedPrompter;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, MockServer, DuckClient, SettingsStore) {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start();
        let client = DuckClient::new(server.base_url()).unwrap();
        let store = SettingsStore::open(dir.path().join("settings.json"));
        (dir, server, client, store)
    }

    fn joined(store: &SettingsStore, timestamp: i64) {
        store
            .update(|s| {
                s.waitlist = Waitlist {
                    timestamp,
                    token: "claim".into(),
                    code: String::new(),
                }
            })
            .unwrap();
    }

    #[test]
    fn test_join_stores_timestamp_and_token() {
        let (_dir, server, client, store) = setup();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/auth/waitlist/join");
            then.status(200).json_body(json!({ "timestamp": 1_650_000_000, "token": "claim" }));
        });
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let manager = WaitlistManager::new(&client, &store, &prompter);

        let outcome = manager.join().unwrap();

        mock.assert();
        assert!(matches!(outcome, JoinOutcome::Joined(_)));
        let waitlist = store.get_all().unwrap().waitlist;
        assert_eq!(waitlist.timestamp, 1_650_000_000);
        assert_eq!(waitlist.token, "claim");
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_rejoin_declined_keeps_place_without_request() {
        let (_dir, server, client, store) = setup();
        joined(&store, 100);
        let mock = server.mock(|when, then| {
            when.method(POST).path("/auth/waitlist/join");
            then.status(200).json_body(json!({ "timestamp": 200, "token": "new" }));
        });
        let prompter = ScriptedPrompter::new(["n"]);
        let manager = WaitlistManager::new(&client, &store, &prompter);

        let outcome = manager.join().unwrap();

        assert!(matches!(outcome, JoinOutcome::Kept(_)));
        mock.assert_calls(0);
        assert_eq!(store.get_all().unwrap().waitlist.token, "claim");
    }

    #[test]
    fn test_rejoin_confirmed_keeps_invite_code() {
        let (_dir, server, client, store) = setup();
        joined(&store, 100);
        store.update(|s| s.waitlist.code = "INVITE".into()).unwrap();
        server.mock(|when, then| {
            when.method(POST).path("/auth/waitlist/join");
            then.status(200).json_body(json!({ "timestamp": 200, "token": "new" }));
        });
        let prompter = ScriptedPrompter::new(["y"]);
        let manager = WaitlistManager::new(&client, &store, &prompter);

        manager.join().unwrap();

        let waitlist = store.get_all().unwrap().waitlist;
        assert_eq!(waitlist.timestamp, 200);
        assert_eq!(waitlist.token, "new");
        assert_eq!(waitlist.code, "INVITE");
    }

    #[test]
    fn test_check_requires_join() {
        let (_dir, server, client, store) = setup();
        let status = server.mock(|when, then| {
            when.method(GET).path("/auth/waitlist/status");
            then.status(200).json_body(json!({ "timestamp": 1 }));
        });
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let manager = WaitlistManager::new(&client, &store, &prompter);

        assert!(matches!(manager.check(), Err(DdgError::Waitlist { .. })));
        assert!(matches!(manager.get_code(), Err(DdgError::Waitlist { .. })));
        status.assert_calls(0);
    }

    #[test]
    fn test_check_compares_timestamps() {
        let (_dir, server, client, store) = setup();
        joined(&store, 500);
        let mut status = server.mock(|when, then| {
            when.method(GET).path("/auth/waitlist/status");
            then.status(200).json_body(json!({ "timestamp": 499 }));
        });
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let manager = WaitlistManager::new(&client, &store, &prompter);

        assert_eq!(
            manager.check().unwrap(),
            Eligibility::NotYet {
                current: 499,
                joined: 500
            }
        );

        status.delete();
        server.mock(|when, then| {
            when.method(GET).path("/auth/waitlist/status");
            then.status(200).json_body(json!({ "timestamp": 500 }));
        });
        assert_eq!(manager.check().unwrap(), Eligibility::Eligible);
    }

    #[test]
    fn test_get_code_stores_code() {
        let (_dir, server, client, store) = setup();
        joined(&store, 500);
        server.mock(|when, then| {
            when.method(POST).path("/auth/waitlist/code").body("token=claim");
            then.status(200).json_body(json!({ "code": "INVITE-9" }));
        });
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let manager = WaitlistManager::new(&client, &store, &prompter);

        assert_eq!(manager.get_code().unwrap().as_deref(), Some("INVITE-9"));
        assert_eq!(store.get_all().unwrap().waitlist.code, "INVITE-9");
    }

    #[test]
    fn test_get_code_empty_response_is_not_eligible() {
        let (_dir, server, client, store) = setup();
        joined(&store, 500);
        server.mock(|when, then| {
            when.method(POST).path("/auth/waitlist/code");
            then.status(200).json_body(json!({}));
        });
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let manager = WaitlistManager::new(&client, &store, &prompter);

        assert_eq!(manager.get_code().unwrap(), None);
        assert!(store.get_all().unwrap().waitlist.code.is_empty());
    }
}
