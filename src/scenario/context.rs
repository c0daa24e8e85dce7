//! Session context threaded through every step
//!
//! Holds the authenticated client and the state steps hand to each other.
//! Steps only write to it after all of their assertions pass.

use crate::api::RevueClient;
use crate::common::config::Credentials;
use crate::common::{Error, Result};

use super::config::Target;
use super::plan::Fact;

/// Authenticated session plus cross-step state for one run
pub struct SessionContext {
    client: RevueClient,
    credentials: Credentials,
    reauthenticate: bool,
    captured_id: Option<String>,
    captured_edited: bool,
    deleted_id: Option<String>,
    created: usize,
}

impl SessionContext {
    /// Create a context; no request is sent until the first step
    pub fn new(client: RevueClient, credentials: Credentials, reauthenticate: bool) -> Self {
        Self {
            client,
            credentials,
            reauthenticate,
            captured_id: None,
            captured_edited: false,
            deleted_id: None,
            created: 0,
        }
    }

    pub fn client(&self) -> &RevueClient {
        &self.client
    }

    /// Establish the session before a step
    ///
    /// With `reauthenticate` set this logs in before every step, otherwise
    /// only when no token is held yet. Any error here is fatal for the run.
    pub async fn ensure_authenticated(&mut self) -> Result<()> {
        if self.reauthenticate || !self.client.is_authenticated() {
            self.client.authenticate(&self.credentials).await?;
        }
        Ok(())
    }

    /// Whether a fact is currently available
    pub fn has(&self, fact: Fact) -> bool {
        match fact {
            Fact::RevueCreated => self.created > 0,
            Fact::RevueId => self.captured_id.is_some(),
            Fact::RevueEdited => self.captured_id.is_some() && self.captured_edited,
            Fact::RevueDeleted => self.deleted_id.is_some(),
        }
    }

    /// Facts from `consumes` that are not available
    pub fn missing(&self, consumes: &[Fact]) -> Vec<Fact> {
        consumes.iter().copied().filter(|f| !self.has(*f)).collect()
    }

    pub fn captured_id(&self) -> Option<&str> {
        self.captured_id.as_deref()
    }

    pub fn deleted_id(&self) -> Option<&str> {
        self.deleted_id.as_deref()
    }

    /// Number of successful creates in this run
    pub fn created(&self) -> usize {
        self.created
    }

    /// Resolve an edit/delete target to a concrete id
    pub fn resolve(&self, step: &str, target: &Target) -> Result<String> {
        match target {
            Target::Id(id) => Ok(id.clone()),
            Target::Captured => self
                .captured_id
                .clone()
                .ok_or_else(|| Error::MissingState {
                    step: step.to_string(),
                    fact: Fact::RevueId,
                }),
        }
    }

    pub(crate) fn record_created(&mut self) {
        self.created += 1;
    }

    pub(crate) fn capture(&mut self, id: String) {
        tracing::debug!(id = %id, "Captured revue id");
        self.captured_id = Some(id);
        self.captured_edited = false;
    }

    /// Remember a successful edit; only edits of the captured id count
    pub(crate) fn record_edited(&mut self, id: &str) {
        if self.captured_id.as_deref() == Some(id) {
            self.captured_edited = true;
        }
    }

    /// Remember a successful delete; a deleted captured id is released
    pub(crate) fn record_deleted(&mut self, id: String) {
        if self.captured_id.as_deref() == Some(id.as_str()) {
            self.captured_id = None;
            self.captured_edited = false;
        }
        self.deleted_id = Some(id);
    }

    /// Release the session at teardown
    pub fn close(mut self) {
        self.client.clear_token();
        tracing::debug!(created = self.created(), "Session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn context() -> SessionContext {
        let client = RevueClient::new("http://127.0.0.1:9/api", Duration::from_secs(1)).unwrap();
        SessionContext::new(client, Credentials::default(), true)
    }

    #[test]
    fn test_facts_follow_state() {
        let mut ctx = context();
        assert_eq!(
            ctx.missing(&[Fact::RevueCreated, Fact::RevueId]),
            vec![Fact::RevueCreated, Fact::RevueId]
        );

        ctx.record_created();
        ctx.record_created();
        assert_eq!(ctx.created(), 2);
        ctx.capture("abc".to_string());
        assert!(ctx.missing(&[Fact::RevueCreated, Fact::RevueId]).is_empty());
        assert_eq!(ctx.resolve("edit", &Target::Captured).unwrap(), "abc");

        ctx.record_deleted("abc".to_string());
        assert!(!ctx.has(Fact::RevueId));
        assert!(ctx.has(Fact::RevueDeleted));
        assert_eq!(ctx.deleted_id(), Some("abc"));
    }

    #[test]
    fn test_edit_tracks_captured_id() {
        let mut ctx = context();
        ctx.capture("abc".to_string());
        ctx.record_edited("xyz");
        assert!(!ctx.has(Fact::RevueEdited));

        ctx.record_edited("abc");
        assert!(ctx.has(Fact::RevueEdited));

        // A fresh capture starts unedited
        ctx.capture("def".to_string());
        assert!(!ctx.has(Fact::RevueEdited));
    }

    #[test]
    fn test_deleting_other_id_keeps_capture() {
        let mut ctx = context();
        ctx.capture("abc".to_string());
        ctx.record_deleted("xyz".to_string());
        assert_eq!(ctx.captured_id(), Some("abc"));
    }

    #[test]
    fn test_resolve_without_capture() {
        let ctx = context();
        let err = ctx.resolve("edit_revue", &Target::Captured).unwrap_err();
        assert!(matches!(err, Error::MissingState { fact: Fact::RevueId, .. }));
        assert_eq!(
            ctx.resolve("edit", &Target::Id("0".to_string())).unwrap(),
            "0"
        );
    }
}
