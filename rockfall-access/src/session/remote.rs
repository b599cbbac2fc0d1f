//! Provider backed by a GoTrue-style auth API and a PostgREST `profiles` table.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, Response, StatusCode};
use rockfall_core::observability::TracedClientExt;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::store::SessionStore;
use super::{AuthEvent, AuthSession, Credentials, Identity, SessionProvider};
use crate::error::SessionError;
use crate::principal::Principal;
use crate::role::{Role, Vocabulary};

/// Well-known key of the persisted token record.
pub const SESSION_RECORD_KEY: &str = "remote-session";

const PGRST_SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const EXPIRY_SKEW_SECONDS: i64 = 10;
const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the project, e.g. https://xyz.supabase.co
    pub url: String,
    /// Public API key sent as `apikey` on every request.
    pub anon_key: Secret<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Row of the `profiles` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    pub mine_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn into_principal(self) -> Principal {
        let name = self
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "User".to_string());

        Principal {
            id: self.id,
            name,
            email: self.email,
            role: self.role.translate(Vocabulary::Profile),
            assigned_site_id: self.mine_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
    user_id: String,
    #[serde(default)]
    email: Option<String>,
}

impl StoredSession {
    fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + ChronoDuration::seconds(EXPIRY_SKEW_SECONDS)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl StoredSession {
    /// Rejects token lifetimes that are negative or overflow the clock.
    fn from_token(token: TokenResponse, now: DateTime<Utc>) -> Result<Self, SessionError> {
        let expires_at = (token.expires_in >= 0)
            .then(|| ChronoDuration::try_seconds(token.expires_in))
            .flatten()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                SessionError::MalformedResponse(format!(
                    "token expires_in out of range: {}",
                    token.expires_in
                ))
            })?;

        Ok(Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user_id: token.user.id,
            email: token.user.email,
        })
    }
}

pub struct RemoteSessionProvider {
    client: Client,
    settings: RemoteSettings,
    store: Arc<dyn SessionStore>,
    events: broadcast::Sender<AuthEvent>,
}

impl RemoteSessionProvider {
    pub fn new(settings: RemoteSettings, store: Arc<dyn SessionStore>) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            client,
            settings,
            store,
            events,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url.trim_end_matches('/'), path)
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }

    async fn load_stored(&self) -> Result<Option<StoredSession>, SessionError> {
        let Some(raw) = self.store.load(SESSION_RECORD_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt stored session");
                self.purge_record().await;
                Ok(None)
            }
        }
    }

    async fn save_stored(&self, stored: &StoredSession) -> Result<(), SessionError> {
        let record = serde_json::to_string(stored)?;
        self.store.save(SESSION_RECORD_KEY, &record).await
    }

    async fn purge_record(&self) {
        if let Err(e) = self.store.remove(SESSION_RECORD_KEY).await {
            tracing::warn!(error = %e, "Failed to purge stored session record");
        }
    }

    async fn request_token(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<StoredSession, SessionError> {
        let response = self
            .client
            .traced_post(&self.url("/auth/v1/token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", self.settings.anon_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let token: TokenResponse = response.json().await?;
                StoredSession::from_token(token, Utc::now())
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(SessionError::InvalidCredentials)
            }
            _ => Err(unexpected(response).await),
        }
    }

    async fn refresh(&self, stored: &StoredSession) -> Result<StoredSession, SessionError> {
        let refreshed = self
            .request_token(
                "refresh_token",
                serde_json::json!({ "refresh_token": stored.refresh_token }),
            )
            .await
            .map_err(|e| match e {
                SessionError::InvalidCredentials => SessionError::Unauthorized,
                other => other,
            })?;

        self.save_stored(&refreshed).await?;
        self.emit(AuthEvent::TokenRefreshed(refreshed.identity()));
        tracing::debug!(user_id = %refreshed.user_id, "Refreshed access token");
        Ok(refreshed)
    }

    async fn current_user(&self, access_token: &str) -> Result<Identity, SessionError> {
        let response = self
            .client
            .traced_get(&self.url("/auth/v1/user"))
            .header("apikey", self.settings.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = response.json().await?;
                Ok(Identity {
                    user_id: user.id,
                    email: user.email,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SessionError::Unauthorized),
            _ => Err(unexpected(response).await),
        }
    }

    /// Attach the profile, degrading to an identity-only session on failure.
    async fn with_profile(&self, identity: Identity) -> AuthSession {
        match self.fetch_profile(&identity.user_id).await {
            Ok(principal) => AuthSession {
                identity,
                principal: Some(principal),
                profile_error: None,
            },
            Err(e) => {
                tracing::warn!(user_id = %identity.user_id, error = %e, "Error fetching profile");
                AuthSession::without_profile(identity, "Failed to fetch user profile")
            }
        }
    }
}

async fn unexpected(response: Response) -> SessionError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    SessionError::UnexpectedStatus { status, body }
}

#[async_trait]
impl SessionProvider for RemoteSessionProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn restore(&self) -> Result<Option<AuthSession>, SessionError> {
        let Some(mut stored) = self.load_stored().await? else {
            return Ok(None);
        };

        if stored.is_expired(Utc::now()) {
            stored = match self.refresh(&stored).await {
                Ok(refreshed) => refreshed,
                Err(SessionError::Unauthorized) => {
                    tracing::info!(user_id = %stored.user_id, "Stored session expired");
                    self.purge_record().await;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
        }

        let identity = match self.current_user(&stored.access_token).await {
            Ok(identity) => identity,
            Err(SessionError::Unauthorized) => {
                tracing::info!(user_id = %stored.user_id, "Stored session rejected by auth service");
                self.purge_record().await;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        Ok(Some(self.with_profile(identity).await))
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, SessionError> {
        let stored = self
            .request_token(
                "password",
                serde_json::json!({
                    "email": credentials.email,
                    "password": credentials.password.expose_secret(),
                }),
            )
            .await?;

        self.save_stored(&stored).await?;
        let identity = stored.identity();
        tracing::info!(user_id = %identity.user_id, "User signed in with auth service");
        self.emit(AuthEvent::SignedIn(identity.clone()));

        Ok(self.with_profile(identity).await)
    }

    async fn logout(&self) -> Result<(), SessionError> {
        // An unreadable record must not keep the local session alive.
        let stored = match self.load_stored().await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored session during logout");
                None
            }
        };
        self.store.remove(SESSION_RECORD_KEY).await?;
        self.emit(AuthEvent::SignedOut {
            user_id: stored.as_ref().map(|s| s.user_id.clone()),
        });

        let Some(stored) = stored else {
            return Ok(());
        };

        let response = self
            .client
            .traced_post(&self.url("/auth/v1/logout"))
            .header("apikey", self.settings.anon_key.expose_secret())
            .bearer_auth(&stored.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(unexpected(response).await)
        }
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Principal, SessionError> {
        // Row-level security reads the user's token; fall back to the anon key.
        let token = match self.load_stored().await? {
            Some(stored) => stored.access_token,
            None => self.settings.anon_key.expose_secret().clone(),
        };

        let response = self
            .client
            .traced_get(&self.url("/rest/v1/profiles"))
            .query(&[("id", format!("eq.{}", user_id)), ("select", "*".to_string())])
            .header("apikey", self.settings.anon_key.expose_secret())
            .header("accept", PGRST_SINGLE_OBJECT)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SessionError::ProfileUnavailable(format!(
                "profile lookup returned {}",
                response.status()
            )));
        }

        let profile: Profile = response
            .json()
            .await
            .map_err(|e| SessionError::ProfileUnavailable(e.to_string()))?;

        Ok(profile.into_principal())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<AuthEvent>> {
        Some(self.events.subscribe())
    }
}
