//! Session store: the single owner of "who is logged in".
//!
//! State moves `Loading -> Authenticated | Anonymous`. Every authenticated
//! transition writes the persisted entry and every return to anonymous removes
//! it, so a restarted process can `restore()` where the last one left off.
//! Consumers read the current state or `subscribe()` to a watch channel.

pub mod storage;

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::auth::{read_claims, AuthService, AuthSession};
use crate::error::{AppError, AuthError};
use crate::types::Identity;
use storage::SessionStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Persisted entry not read yet
    Loading,
    Authenticated(Identity),
    Anonymous,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

/// Persisted form: the identity's fields at the top level plus the bearer token
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    #[serde(flatten)]
    identity: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default)]
    first_login: bool,
}

impl From<&AuthSession> for StoredSession {
    fn from(session: &AuthSession) -> Self {
        Self {
            identity: session.identity.clone(),
            access_token: session.token.clone(),
            first_login: session.first_login,
        }
    }
}

impl From<StoredSession> for AuthSession {
    fn from(stored: StoredSession) -> Self {
        Self {
            identity: stored.identity,
            token: stored.access_token,
            first_login: stored.first_login,
        }
    }
}

pub struct SessionStore {
    auth: Arc<dyn AuthService>,
    storage: Arc<dyn SessionStorage>,
    storage_key: String,
    state: watch::Sender<SessionState>,
    session: Mutex<Option<AuthSession>>,
}

impl SessionStore {
    pub fn new(
        auth: Arc<dyn AuthService>,
        storage: Arc<dyn SessionStorage>,
        storage_key: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            auth,
            storage,
            storage_key: storage_key.into(),
            state,
            session: Mutex::new(None),
        }
    }

    pub fn auth_service(&self) -> &dyn AuthService {
        self.auth.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.lock_session().clone()
    }

    /// Bearer token for API calls, when the backend issued one
    pub fn token(&self) -> Option<String> {
        self.lock_session().as_ref().and_then(|s| s.token.clone())
    }

    /// Read the persisted entry. Unreadable or expired entries are discarded.
    pub fn restore(&self) -> SessionState {
        let restored = match self.read_persisted() {
            Ok(Some(session)) => Some(session),
            Ok(None) => None,
            Err(reason) => {
                tracing::warn!("Discarding persisted session: {}", reason);
                if let Err(e) = self.storage.remove(&self.storage_key) {
                    tracing::warn!("Failed to remove persisted session: {}", e);
                }
                None
            }
        };

        match restored {
            Some(session) => {
                tracing::debug!("Restored session for {}", session.identity.email);
                self.transition(Some(session))
            }
            None => self.transition(None),
        }
    }

    fn read_persisted(&self) -> Result<Option<AuthSession>, String> {
        let Some(raw) = self.storage.get(&self.storage_key).map_err(|e| e.to_string())? else {
            return Ok(None);
        };

        let stored: StoredSession = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
        if let Some(token) = &stored.access_token {
            let claims = read_claims(token).map_err(|e| e.to_string())?;
            if claims.is_expired() {
                return Err(AuthError::SessionExpired.to_string());
            }
        }

        Ok(Some(stored.into()))
    }

    /// Authenticate and persist. A failure leaves the state as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        tracing::debug!("Logging in {} via {} auth", email, self.auth.name());
        let session = self.auth.login(email.trim(), password).await?;

        self.persist(&session)?;
        self.transition(Some(session.clone()));
        tracing::info!("Session started for {} ({})", session.identity.email, session.identity.role);

        Ok(session)
    }

    /// Remove the persisted entry, then go anonymous. The remote logout is best effort.
    ///
    /// If the entry cannot be removed the session stays authenticated, so memory
    /// never disagrees with what the next `restore()` would find.
    pub async fn logout(&self) -> Result<(), AppError> {
        let previous = self.session();

        if let Some(session) = &previous {
            if let Err(e) = self.auth.logout(session).await {
                tracing::warn!("Remote logout failed: {}", e);
            }
        }

        if let Err(e) = self.storage.remove(&self.storage_key) {
            tracing::warn!("Could not remove persisted session: {}", e);
            return Err(e.into());
        }

        self.transition(None);
        Ok(())
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<(), AppError> {
        let session = self.session().ok_or(AuthError::NotAuthenticated)?;

        self.auth
            .change_password(&session, current_password, new_password)
            .await?;

        // The initial-password prompt is satisfied now
        if session.first_login {
            let updated = AuthSession {
                first_login: false,
                ..session
            };
            self.persist(&updated)?;
            *self.lock_session() = Some(updated);
        }

        tracing::info!("Password changed");
        Ok(())
    }

    fn persist(&self, session: &AuthSession) -> Result<(), AppError> {
        let raw = serde_json::to_string(&StoredSession::from(session)).map_err(storage::StorageError::from)?;
        self.storage.set(&self.storage_key, &raw)?;
        Ok(())
    }

    fn transition(&self, session: Option<AuthSession>) -> SessionState {
        let state = match &session {
            Some(s) => SessionState::Authenticated(s.identity.clone()),
            None => SessionState::Anonymous,
        };

        *self.lock_session() = session;
        self.state.send_replace(state.clone());
        state
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<AuthSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
