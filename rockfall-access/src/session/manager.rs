//! Owner of the process-wide current-principal slot.

use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::{AuthEvent, AuthSession, AuthSnapshot, Credentials, SessionProvider};
use crate::error::SessionError;
use crate::evaluator;
use crate::principal::Principal;
use crate::role::Role;

const PROFILE_WARNING: &str = "Failed to fetch user profile";

/// Drives the session lifecycle against one provider and publishes every
/// transition through a `watch` channel. Readers always see the latest write.
pub struct SessionManager {
    provider: Arc<dyn SessionProvider>,
    slot: Arc<watch::Sender<AuthSnapshot>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        let (slot, _) = watch::channel(AuthSnapshot::unauthenticated());
        Self {
            provider,
            slot: Arc::new(slot),
            listener: Mutex::new(None),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Unauthenticated -> Restoring -> Authenticated | Unauthenticated.
    ///
    /// Restore failures never surface: whatever went wrong, the session
    /// simply starts out unauthenticated.
    pub async fn start(&self) -> AuthSnapshot {
        self.spawn_listener();
        self.slot.send_replace(AuthSnapshot::restoring());

        let next = match self.provider.restore().await {
            Ok(Some(session)) => {
                tracing::info!(
                    provider = self.provider.name(),
                    user_id = %session.identity.user_id,
                    "Session restored"
                );
                AuthSnapshot::authenticated(session)
            }
            Ok(None) => AuthSnapshot::unauthenticated(),
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "Session restore failed");
                AuthSnapshot::unauthenticated()
            }
        };

        self.slot.send_replace(next.clone());
        next
    }

    /// On failure the slot is left untouched, so no partial principal is ever published.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSnapshot, SessionError> {
        let credentials = Credentials::new(email, password);
        match self.provider.login(&credentials).await {
            Ok(session) => Ok(self.publish(session)),
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "Login failed");
                Err(e)
            }
        }
    }

    /// Always ends unauthenticated. A failed remote sign-out is kept as the
    /// snapshot's warning.
    pub async fn logout(&self) -> AuthSnapshot {
        let result = self.provider.logout().await;

        let mut next = AuthSnapshot::unauthenticated();
        match result {
            Ok(()) => tracing::info!(provider = self.provider.name(), "User logged out"),
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "Logout error");
                next = next.with_warning(format!("Failed to logout: {}", e));
            }
        }

        self.slot.send_replace(next.clone());
        next
    }

    /// Retry a profile fetch for the signed-in identity.
    pub async fn refresh_profile(&self) -> Result<AuthSnapshot, SessionError> {
        let Some(identity) = self.slot.borrow().identity.clone() else {
            return Err(SessionError::Unauthorized);
        };

        match self.provider.fetch_profile(&identity.user_id).await {
            Ok(principal) => {
                apply_profile(&self.slot, &identity.user_id, Ok(principal));
                Ok(self.snapshot())
            }
            Err(e) => {
                apply_profile(&self.slot, &identity.user_id, Err(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.slot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.slot.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.slot.borrow().is_authenticated()
    }

    pub fn has_role(&self, required: impl AsRef<[Role]>) -> bool {
        evaluator::has_role(self.slot.borrow().principal.as_ref(), required)
    }

    pub fn can_access_mine(&self, site_id: &str) -> bool {
        evaluator::can_access_mine(self.slot.borrow().principal.as_ref(), site_id)
    }

    fn publish(&self, session: AuthSession) -> AuthSnapshot {
        let snapshot = AuthSnapshot::authenticated(session);
        self.slot.send_replace(snapshot.clone());
        snapshot
    }

    fn spawn_listener(&self) {
        let Ok(mut listener) = self.listener.lock() else {
            return;
        };
        if listener.is_some() {
            return;
        }
        let Some(events) = self.provider.subscribe() else {
            return;
        };

        let handle = tokio::spawn(listen(events, self.provider.clone(), self.slot.clone()));
        *listener = Some(handle);
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

/// Applies provider events to the slot. Events only ever touch the session
/// they name, so a late event cannot resurrect a session that was logged out.
async fn listen(
    mut events: broadcast::Receiver<AuthEvent>,
    provider: Arc<dyn SessionProvider>,
    slot: Arc<watch::Sender<AuthSnapshot>>,
) {
    loop {
        match events.recv().await {
            Ok(AuthEvent::SignedIn(identity)) | Ok(AuthEvent::TokenRefreshed(identity)) => {
                let profile = provider
                    .fetch_profile(&identity.user_id)
                    .await
                    .map_err(|e| e.to_string());
                apply_profile(&slot, &identity.user_id, profile);
            }
            Ok(AuthEvent::SignedOut { user_id }) => {
                slot.send_if_modified(|snapshot| {
                    let current = snapshot.identity.as_ref().map(|i| i.user_id.as_str());
                    if current.is_some() && current == user_id.as_deref() {
                        *snapshot = AuthSnapshot::unauthenticated();
                        true
                    } else {
                        false
                    }
                });
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Auth event listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn apply_profile(
    slot: &watch::Sender<AuthSnapshot>,
    user_id: &str,
    profile: Result<Principal, String>,
) {
    slot.send_if_modified(|snapshot| {
        let same_user = snapshot
            .identity
            .as_ref()
            .is_some_and(|identity| identity.user_id == user_id);
        if !same_user {
            return false;
        }
        match profile {
            Ok(principal) => {
                if snapshot.principal.as_ref() == Some(&principal) && snapshot.warning.is_none() {
                    return false;
                }
                snapshot.principal = Some(principal);
                snapshot.warning = None;
            }
            Err(error) => {
                tracing::warn!(user_id, error = %error, "Error fetching profile");
                if snapshot.warning.as_deref() == Some(PROFILE_WARNING) {
                    return false;
                }
                snapshot.warning = Some(PROFILE_WARNING.to_string());
            }
        }
        true
    });
}
