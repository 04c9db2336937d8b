//! Alias generation and the local alias log
//!
//! The service has no endpoint to list or delete aliases, so the log kept in
//! the settings file is the only record of what this tool created.

use crate::{
    core::{
        api::{DuckClient, full_address},
        settings::{GeneratedEmail, SettingsStore},
    },
    error::{DdgError, Result},
};
use tracing::{debug, instrument};

/// Category recorded when `--category` is not given
pub const DEFAULT_CATEGORY: &str = "default";

/// Addresses compare case-insensitively, with or without `@duck.com`
fn same_address(a: &str, b: &str) -> bool {
    full_address(a.trim()).eq_ignore_ascii_case(&full_address(b.trim()))
}

/// View over `generatedEmails` / `amountGenerated`
pub struct AliasBook<'a> {
    store: &'a SettingsStore,
}

impl<'a> AliasBook<'a> {
    pub fn new(store: &'a SettingsStore) -> Self {
        Self { store }
    }

    /// Ask the service for a new alias and log it under `category`
    #[instrument(skip(self, client, access_token))]
    pub fn generate(
        &self,
        client: &DuckClient,
        access_token: &str,
        category: &str,
    ) -> Result<GeneratedEmail> {
        let response = client.create_address(access_token)?;
        self.record(category, &response.full_address())
    }

    /// Append an alias to the log and bump the counter
    pub fn record(&self, category: &str, address: &str) -> Result<GeneratedEmail> {
        let entry = GeneratedEmail {
            category: category.to_string(),
            address: full_address(address),
        };
        let logged = entry.clone();
        let total = self.store.update(move |s| {
            s.generated_emails.push(logged);
            s.amount_generated = s.amount_generated.saturating_add(1);
            s.amount_generated
        })?;
        debug!("Logged alias #{}", total);
        Ok(entry)
    }

    /// Logged aliases, optionally only those in `category`
    pub fn list(&self, category: Option<&str>) -> Result<Vec<GeneratedEmail>> {
        let emails = self.store.get_all()?.generated_emails;
        Ok(match category {
            Some(category) => emails
                .into_iter()
                .filter(|e| e.category.eq_ignore_ascii_case(category.trim()))
                .collect(),
            None => emails,
        })
    }

    /// Count of aliases created through this tool
    pub fn amount(&self) -> Result<u64> {
        Ok(self.store.get_all()?.amount_generated)
    }

    /// Move `address` to `category`, returning the previous category
    #[instrument(skip(self))]
    pub fn change_category(&self, address: &str, category: &str) -> Result<String> {
        let category = category.trim();
        if category.is_empty() {
            return Err(DdgError::validation("category must not be empty"));
        }

        let previous = self.store.update(|s| {
            s.generated_emails
                .iter_mut()
                .find(|e| same_address(&e.address, address))
                .map(|e| std::mem::replace(&mut e.category, category.to_string()))
        })?;

        previous.ok_or_else(|| not_logged(address))
    }

    /// Remove `address` from the log. The counter is left untouched.
    #[instrument(skip(self))]
    pub fn delete(&self, address: &str) -> Result<GeneratedEmail> {
        let removed = self.store.update(|s| {
            s.generated_emails
                .iter()
                .position(|e| same_address(&e.address, address))
                .map(|i| s.generated_emails.remove(i))
        })?;

        removed.ok_or_else(|| not_logged(address))
    }
}

fn not_logged(address: &str) -> DdgError {
    DdgError::validation(format!(
        "{} is not in the local alias log",
        full_address(address.trim())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SettingsStore {
        SettingsStore::open(dir.path().join("settings.json"))
    }

    #[test]
    fn test_generate_logs_full_address_and_counts() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/email/addresses")
                .header("authorization", "Bearer access-token");
            then.status(201).json_body(json!({ "address": "shy-duck-42" }));
        });
        let client = DuckClient::new(server.base_url()).unwrap();
        let book = AliasBook::new(&store);

        let entry = book.generate(&client, "access-token", "shopping").unwrap();

        assert_eq!(entry.address, "shy-duck-42@duck.com");
        assert_eq!(entry.category, "shopping");
        assert_eq!(book.amount().unwrap(), 1);
        assert_eq!(book.list(None).unwrap(), vec![entry]);
    }

    #[test]
    fn test_failed_generation_logs_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/email/addresses");
            then.status(401).json_body(json!({ "error": "invalid token" }));
        });
        let client = DuckClient::new(server.base_url()).unwrap();
        let book = AliasBook::new(&store);

        assert!(book.generate(&client, "bad", DEFAULT_CATEGORY).is_err());
        assert_eq!(book.amount().unwrap(), 0);
        assert!(book.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_record_saturates_counter_at_max() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("amountGenerated", json!(u64::MAX)).unwrap();
        let book = AliasBook::new(&store);

        book.record(DEFAULT_CATEGORY, "last-duck").unwrap();

        assert_eq!(book.amount().unwrap(), u64::MAX);
        assert_eq!(book.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_list_filters_by_category_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let book = AliasBook::new(&store);
        book.record("Shopping", "one").unwrap();
        book.record("news", "two").unwrap();
        book.record("shopping", "three").unwrap();

        let shopping = book.list(Some("SHOPPING")).unwrap();
        let addresses: Vec<_> = shopping.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(addresses, vec!["one@duck.com", "three@duck.com"]);
        assert!(book.list(Some("travel")).unwrap().is_empty());
    }

    #[test]
    fn test_change_category_matches_with_or_without_domain() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let book = AliasBook::new(&store);
        book.record("default", "shy-duck").unwrap();

        let previous = book.change_category("shy-duck", "travel").unwrap();
        assert_eq!(previous, "default");

        let previous = book.change_category("SHY-DUCK@duck.com", "news").unwrap();
        assert_eq!(previous, "travel");
        assert_eq!(book.list(Some("news")).unwrap().len(), 1);
    }

    #[test]
    fn test_change_category_unknown_address() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let book = AliasBook::new(&store);

        let err = book.change_category("ghost", "news").unwrap_err();
        assert!(matches!(err, DdgError::Validation { .. }));
        assert!(matches!(
            book.change_category("ghost", "  "),
            Err(DdgError::Validation { .. })
        ));
    }

    #[test]
    fn test_delete_keeps_counter_and_other_entries() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let book = AliasBook::new(&store);
        book.record("a", "one").unwrap();
        book.record("b", "two").unwrap();

        let removed = book.delete("one@duck.com").unwrap();

        assert_eq!(removed.address, "one@duck.com");
        assert_eq!(book.amount().unwrap(), 2);
        assert_eq!(book.list(None).unwrap().len(), 1);
        assert!(book.delete("one").is_err());
    }
}
