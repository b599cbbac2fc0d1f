use rockfall_access::session::{
    DemoAccount, FileSessionStore, MockSessionProvider, RemoteSessionProvider, RemoteSettings,
    SessionProvider,
};
use rockfall_core::config::{load_settings, TelemetrySettings};
use rockfall_core::error::AppError;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Mock,
    Remote,
}

#[derive(Deserialize, Clone)]
pub struct AuthSettings {
    pub provider: ProviderKind,
    /// Directory holding the persisted session records.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Mock provider: sign unknown emails in as visitors.
    #[serde(default = "default_allow_visitors")]
    pub allow_visitors: bool,
    /// Mock provider: replaces the built-in demo directory when set.
    #[serde(default)]
    pub demo_accounts: Option<Vec<DemoAccount>>,
    #[serde(default)]
    pub login_latency_ms: u64,
    /// Required when `provider` is `remote`.
    #[serde(default)]
    pub remote: Option<RemoteSettings>,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".rockfall/session")
}

fn default_allow_visitors() -> bool {
    true
}

pub fn get_configuration() -> Result<Settings, AppError> {
    load_settings("rockfall-console")
}

/// Build the one provider this process runs with.
pub fn build_provider(auth: &AuthSettings) -> Result<Arc<dyn SessionProvider>, AppError> {
    let store = Arc::new(FileSessionStore::new(auth.store_dir.clone()));

    match auth.provider {
        ProviderKind::Mock => {
            let mut provider = MockSessionProvider::new(store)
                .with_visitors(auth.allow_visitors)
                .with_latency(Duration::from_millis(auth.login_latency_ms));
            if let Some(accounts) = &auth.demo_accounts {
                provider = provider.with_directory(accounts.clone());
            }
            Ok(Arc::new(provider))
        }
        ProviderKind::Remote => {
            let settings = auth.remote.clone().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "auth.remote must be set when auth.provider is remote"
                ))
            })?;
            Ok(Arc::new(RemoteSessionProvider::new(settings, store)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(provider: ProviderKind) -> AuthSettings {
        AuthSettings {
            provider,
            store_dir: default_store_dir(),
            allow_visitors: true,
            demo_accounts: None,
            login_latency_ms: 0,
            remote: None,
        }
    }

    #[test]
    fn builds_mock_provider() {
        let provider = build_provider(&auth(ProviderKind::Mock)).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn remote_provider_requires_settings() {
        let err = build_provider(&auth(ProviderKind::Remote)).err().unwrap();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
