//! Allow-list authority checks.
//!
//! Authorized editors are listed in the `email` field of the `setting/admin`
//! document. A caller has authority only on an exact, case-sensitive match.

use crate::collection::{ADMIN_DOCUMENT_ID, ADMIN_EMAIL_FIELD, SETTINGS_COLLECTION};
use crate::error::CoreResult;
use duastore_codec::{Document, Value};
use duastore_storage::DocumentStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Reads and maintains the admin allow-list.
pub struct AllowList {
    store: Arc<dyn DocumentStore>,
}

impl AllowList {
    /// Creates a gate over a store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns true if `email` is on the allow-list.
    ///
    /// A missing settings document or a missing or ill-typed `email` field
    /// grants nobody.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn check_authority(&self, email: &str) -> CoreResult<bool> {
        let allowed = self.emails().await?.iter().any(|e| e == email);
        debug!(email, allowed, "checked authority");
        Ok(allowed)
    }

    /// Returns the listed emails. Non-text entries are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn emails(&self) -> CoreResult<Vec<String>> {
        let settings = self.settings().await?;
        Ok(listed_emails(settings.as_ref()))
    }

    /// Adds `email` to the allow-list, returning false if already present.
    ///
    /// Other fields of the settings document are preserved. A single-string
    /// `email` field is widened to an array.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn grant(&self, email: &str) -> CoreResult<bool> {
        let mut settings = self.settings().await?.unwrap_or_default();
        let mut emails = listed_emails(Some(&settings));
        if emails.iter().any(|e| e == email) {
            return Ok(false);
        }
        emails.push(email.to_string());
        settings.insert(ADMIN_EMAIL_FIELD.to_string(), Value::from(emails));
        self.store
            .put(SETTINGS_COLLECTION, ADMIN_DOCUMENT_ID, settings)
            .await?;
        info!(email, "granted authority");
        Ok(true)
    }

    async fn settings(&self) -> CoreResult<Option<Document>> {
        Ok(self
            .store
            .get(SETTINGS_COLLECTION, ADMIN_DOCUMENT_ID)
            .await?)
    }
}

fn listed_emails(settings: Option<&Document>) -> Vec<String> {
    match settings.and_then(|s| s.get(ADMIN_EMAIL_FIELD)) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_text().map(str::to_string))
            .collect(),
        Some(Value::Text(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}
