pub mod http;
pub mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AuthError};
use crate::types::Identity;

pub use http::HttpAuthService;
pub use mock::MockAuthService;

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: Identity,
    /// Bearer token for the remote backend; the mock service issues none
    pub token: Option<String>,
    /// Backend asks the user to change the initial password
    #[serde(default)]
    pub first_login: bool,
}

impl AuthSession {
    pub fn without_token(identity: Identity) -> Self {
        Self {
            identity,
            token: None,
            first_login: false,
        }
    }
}

/// Authentication seam used by the session store
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Service name for logging
    fn name(&self) -> &'static str;

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;

    async fn change_password(
        &self,
        session: &AuthSession,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError>;

    /// Invalidate the session server-side. Local state is cleared regardless.
    async fn logout(&self, _session: &AuthSession) -> Result<(), AppError> {
        Ok(())
    }
}

/// Claims carried by backend access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl Claims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Read the claims of a bearer token.
///
/// The signing secret lives on the server, so the signature is not checked here;
/// the claims are only used to notice expiry before the server does.
pub fn read_claims(token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}
