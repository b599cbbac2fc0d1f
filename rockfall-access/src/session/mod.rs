//! Session lifecycle shared by every identity provider.
//!
//! ```text
//! Unauthenticated --start--> Restoring --ok--> Authenticated
//!        ^                       |                  |
//!        +------ missing/corrupt-+                  |
//!        +<------------------ logout ---------------+
//!        +------------------- login --------------> Authenticated
//! ```

pub mod manager;
pub mod mock;
pub mod remote;
pub mod store;

use async_trait::async_trait;
use secrecy::Secret;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::SessionError;
use crate::evaluator::AccessEvaluator;
use crate::guard::{self, AccessDenied, View};
use crate::principal::Principal;

pub use manager::SessionManager;
pub use mock::{DemoAccount, MockSessionProvider};
pub use remote::{Profile, RemoteSessionProvider, RemoteSettings};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Restoring,
    Authenticated,
}

/// The authenticated account behind a session, independent of its profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// What a provider hands back after login or restore.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub identity: Identity,
    /// `None` when the credentials were accepted but the profile could not be loaded.
    pub principal: Option<Principal>,
    pub profile_error: Option<String>,
}

impl AuthSession {
    pub fn with_principal(principal: Principal) -> Self {
        Self {
            identity: Identity {
                user_id: principal.id.clone(),
                email: principal.email.clone(),
            },
            principal: Some(principal),
            profile_error: None,
        }
    }

    pub fn without_profile(identity: Identity, error: impl Into<String>) -> Self {
        Self {
            identity,
            principal: None,
            profile_error: Some(error.into()),
        }
    }
}

/// Contents of the process-wide current-principal slot.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSnapshot {
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// Last non-fatal failure (profile fetch, remote sign-out).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl AuthSnapshot {
    pub fn unauthenticated() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            identity: None,
            principal: None,
            warning: None,
        }
    }

    pub fn restoring() -> Self {
        Self {
            state: SessionState::Restoring,
            ..Self::unauthenticated()
        }
    }

    pub fn authenticated(session: AuthSession) -> Self {
        Self {
            state: SessionState::Authenticated,
            identity: Some(session.identity),
            principal: session.principal,
            warning: session.profile_error,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Restoring
    }

    pub fn evaluator(&self) -> AccessEvaluator<'_> {
        AccessEvaluator::new(self.principal.as_ref())
    }

    /// Like [`guard::authorize_view`], but tells a missing profile apart
    /// from a missing session.
    pub fn authorize_view(&self, view: View) -> Result<(), AccessDenied> {
        if self.is_authenticated() && self.principal.is_none() {
            return Err(AccessDenied::ProfileUnavailable);
        }
        guard::authorize_view(self.principal.as_ref(), view)
    }
}

pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Secret::new(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Session changes pushed by providers backed by an external auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    TokenRefreshed(Identity),
    SignedOut { user_id: Option<String> },
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Recover a persisted session. Missing or corrupt records yield `Ok(None)`
    /// and corrupt ones are purged.
    async fn restore(&self) -> Result<Option<AuthSession>, SessionError>;

    /// Validate credentials and persist the resulting session.
    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, SessionError>;

    /// Drop the persisted session. The local record is always removed before
    /// any remote failure is reported.
    async fn logout(&self) -> Result<(), SessionError>;

    async fn fetch_profile(&self, user_id: &str) -> Result<Principal, SessionError>;

    /// Change notifications, for providers that have them.
    fn subscribe(&self) -> Option<broadcast::Receiver<AuthEvent>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn identity() -> Identity {
        Identity {
            user_id: "u-1".into(),
            email: None,
        }
    }

    #[test]
    fn missing_profile_is_not_reported_as_signed_out() {
        let snapshot = AuthSnapshot::authenticated(AuthSession::without_profile(
            identity(),
            "Failed to fetch user profile",
        ));
        assert_eq!(
            snapshot.authorize_view(View::Overview),
            Err(AccessDenied::ProfileUnavailable)
        );
        assert_eq!(
            AuthSnapshot::unauthenticated().authorize_view(View::Overview),
            Err(AccessDenied::Unauthenticated)
        );
    }

    #[test]
    fn loaded_profile_follows_the_view_table() {
        let principal = Principal::new("u-1", "Pat", Role::Operator);
        let snapshot = AuthSnapshot::authenticated(AuthSession::with_principal(principal));
        assert!(snapshot.authorize_view(View::Sensors).is_ok());
        assert!(matches!(
            snapshot.authorize_view(View::Users),
            Err(AccessDenied::MissingRole { .. })
        ));
    }
}
