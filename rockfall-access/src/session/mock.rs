//! Local provider backed by a fixed demo directory.
//!
//! There is no credential verification here: any non-empty password is
//! accepted for a known account. It exists so the console can be run without
//! an auth service, and it sits behind [`SessionProvider`] so a real verifier
//! can replace it without touching consumers of the evaluator.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::store::SessionStore;
use super::{AuthSession, Credentials, SessionProvider};
use crate::error::SessionError;
use crate::principal::Principal;
use crate::role::Role;

/// Well-known key of the persisted principal record.
pub const USER_RECORD_KEY: &str = "user";

const VISITOR_ID: &str = "user-1";
const VISITOR_NAME: &str = "Demo User";

#[derive(Debug, Clone, Deserialize)]
pub struct DemoAccount {
    pub email: String,
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub assigned_site_id: Option<String>,
}

impl DemoAccount {
    pub fn new(
        email: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            email: email.into(),
            id: id.into(),
            name: name.into(),
            role,
            assigned_site_id: None,
        }
    }

    pub fn with_site(mut self, site_id: impl Into<String>) -> Self {
        self.assigned_site_id = Some(site_id.into());
        self
    }

    /// The four demo users of the dashboard.
    pub fn defaults() -> Vec<DemoAccount> {
        vec![
            DemoAccount::new("operator@rockfall.dev", "op-42", "John Operator", Role::Operator)
                .with_site("mine-12"),
            DemoAccount::new(
                "inspector@rockfall.dev",
                "ins-01",
                "Sarah Inspector",
                Role::Inspector,
            ),
            DemoAccount::new("admin@rockfall.dev", "adm-01", "Admin User", Role::MainAdmin),
            DemoAccount::new("site@rockfall.dev", "site-01", "Site Admin", Role::SiteAdmin),
        ]
    }

    fn principal(&self, email: &str) -> Principal {
        Principal {
            id: self.id.clone(),
            name: self.name.clone(),
            email: Some(email.to_string()),
            role: self.role,
            assigned_site_id: self.assigned_site_id.clone(),
        }
    }
}

pub struct MockSessionProvider {
    store: Arc<dyn SessionStore>,
    directory: Vec<DemoAccount>,
    allow_visitors: bool,
    latency: Duration,
}

impl MockSessionProvider {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            directory: DemoAccount::defaults(),
            allow_visitors: true,
            latency: Duration::ZERO,
        }
    }

    pub fn with_directory(mut self, directory: Vec<DemoAccount>) -> Self {
        self.directory = directory;
        self
    }

    /// Unknown emails sign in as a visitor when enabled.
    pub fn with_visitors(mut self, allow: bool) -> Self {
        self.allow_visitors = allow;
        self
    }

    /// Artificial delay applied to login, to mimic a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn lookup(&self, email: &str) -> Option<&DemoAccount> {
        self.directory
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email))
    }

    async fn purge_record(&self) {
        if let Err(e) = self.store.remove(USER_RECORD_KEY).await {
            tracing::warn!(error = %e, "Failed to purge stored session record");
        }
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn restore(&self) -> Result<Option<AuthSession>, SessionError> {
        let Some(raw) = self.store.load(USER_RECORD_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Principal>(&raw) {
            Ok(principal) => {
                tracing::debug!(user_id = %principal.id, "Restored stored session");
                Ok(Some(AuthSession::with_principal(principal)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt stored session");
                self.purge_record().await;
                Ok(None)
            }
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, SessionError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let email = credentials.email.trim();
        if email.is_empty() || credentials.password.expose_secret().is_empty() {
            return Err(SessionError::InvalidCredentials);
        }

        let principal = match self.lookup(email) {
            Some(account) => account.principal(email),
            None if self.allow_visitors => {
                Principal::new(VISITOR_ID, VISITOR_NAME, Role::Visitor).with_email(email)
            }
            None => return Err(SessionError::InvalidCredentials),
        };

        let record = serde_json::to_string(&principal)?;
        self.store.save(USER_RECORD_KEY, &record).await?;

        tracing::info!(
            user_id = %principal.id,
            role = %principal.role,
            "User logged in with demo directory"
        );

        Ok(AuthSession::with_principal(principal))
    }

    async fn logout(&self) -> Result<(), SessionError> {
        self.store.remove(USER_RECORD_KEY).await
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Principal, SessionError> {
        if let Some(account) = self.directory.iter().find(|account| account.id == user_id) {
            return Ok(account.principal(&account.email));
        }

        // Visitors only exist in the stored record.
        let stored = self
            .store
            .load(USER_RECORD_KEY)
            .await?
            .and_then(|raw| serde_json::from_str::<Principal>(&raw).ok())
            .filter(|principal| principal.id == user_id);

        stored.ok_or_else(|| SessionError::ProfileUnavailable(format!("unknown user {}", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::MemorySessionStore;

    fn provider() -> (Arc<MemorySessionStore>, MockSessionProvider) {
        let store = Arc::new(MemorySessionStore::new());
        let provider = MockSessionProvider::new(store.clone());
        (store, provider)
    }

    #[tokio::test]
    async fn directory_lookup_ignores_case() {
        let (_, provider) = provider();
        let session = provider
            .login(&Credentials::new("Operator@Rockfall.dev", "pw"))
            .await
            .unwrap();
        let principal = session.principal.unwrap();
        assert_eq!(principal.id, "op-42");
        assert_eq!(principal.assigned_site_id.as_deref(), Some("mine-12"));
    }

    #[tokio::test]
    async fn unknown_email_becomes_visitor() {
        let (_, provider) = provider();
        let session = provider
            .login(&Credentials::new("someone@example.com", "pw"))
            .await
            .unwrap();
        let principal = session.principal.unwrap();
        assert_eq!(principal.role, Role::Visitor);
        assert_eq!(principal.assigned_site_id, None);
    }

    #[tokio::test]
    async fn unknown_email_rejected_without_visitors() {
        let (store, provider) = provider();
        let provider = provider.with_visitors(false);
        let err = provider
            .login(&Credentials::new("someone@example.com", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials));
        assert_eq!(store.load(USER_RECORD_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_password_rejected() {
        let (_, provider) = provider();
        let err = provider
            .login(&Credentials::new("admin@rockfall.dev", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials));
    }

    #[tokio::test]
    async fn fetch_profile_finds_visitor_in_stored_record() {
        let (_, provider) = provider();
        provider
            .login(&Credentials::new("guest@example.com", "pw"))
            .await
            .unwrap();
        let principal = provider.fetch_profile(VISITOR_ID).await.unwrap();
        assert_eq!(principal.role, Role::Visitor);
        assert!(provider.fetch_profile("nobody").await.is_err());
    }
}
