use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::{AuthService, HttpAuthService, MockAuthService};
use crate::config::{AppConfig, AuthBackend};
use crate::session::storage::FileStorage;
use crate::session::SessionStore;

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("EVAL_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("course-eval").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Persisted session entries live next to the rest of the CLI state
pub fn session_storage() -> anyhow::Result<FileStorage> {
    Ok(FileStorage::new(get_config_dir()?))
}

pub fn auth_service(config: &AppConfig) -> anyhow::Result<Arc<dyn AuthService>> {
    Ok(match config.session.auth_backend {
        AuthBackend::Mock => Arc::new(MockAuthService::from_config(config)),
        AuthBackend::Remote => Arc::new(HttpAuthService::new(ApiClient::from_config(config)?)),
    })
}

/// Session store with the persisted entry already restored
pub fn open_session(config: &AppConfig) -> anyhow::Result<SessionStore> {
    let store = SessionStore::new(
        auth_service(config)?,
        Arc::new(session_storage()?),
        config.session.storage_key.clone(),
    );
    store.restore();
    Ok(store)
}

/// API client carrying the session's bearer token, if any
pub fn api_client(config: &AppConfig, session: &SessionStore) -> anyhow::Result<ApiClient> {
    Ok(ApiClient::from_config(config)?.with_token(session.token()))
}
