use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{read_claims, AuthService, AuthSession};
use crate::api::ApiClient;
use crate::error::{AppError, AuthError};
use crate::types::Identity;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    first_login: bool,
}

/// Authentication against the backend's `/auth/*` endpoints
pub struct HttpAuthService {
    client: ApiClient,
}

impl HttpAuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Profile of the token's owner
    pub async fn whoami(&self, token: &str) -> Result<Identity, AppError> {
        let client = self.client.clone().with_token(Some(token.to_string()));
        let builder = client.request(Method::GET, "auth/me")?;
        let response = client.send(builder).await.map_err(|e| match e.status() {
            Some(401) | Some(422) => AuthError::SessionExpired.into(),
            Some(404) => AuthError::UserNotFound.into(),
            _ => e,
        })?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let body = self
            .client
            .send_json(
                Method::POST,
                "auth/login",
                &json!({ "email": email, "password": password }),
            )
            .await
            .map_err(|e| match e.status() {
                Some(401) | Some(403) => AuthError::InvalidCredentials.into(),
                _ => e,
            })?;

        let login: LoginResponse = serde_json::from_value(body)
            .map_err(|e| AppError::request_failed(None, format!("Malformed login response: {}", e)))?;

        // Reject tokens we cannot even read before persisting anything
        let claims = read_claims(&login.access_token)?;
        if claims.is_expired() {
            return Err(AuthError::SessionExpired.into());
        }

        let identity = self.whoami(&login.access_token).await?;
        tracing::info!("Logged in {} as {}", identity.email, identity.role);

        Ok(AuthSession {
            identity,
            token: Some(login.access_token),
            first_login: login.first_login,
        })
    }

    async fn change_password(
        &self,
        session: &AuthSession,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let token = session.token.clone().ok_or(AuthError::NotAuthenticated)?;
        let client = self.client.clone().with_token(Some(token));

        client
            .send_json(
                Method::POST,
                "auth/change-password",
                &json!({ "old_password": current_password, "new_password": new_password }),
            )
            .await
            .map_err(|e| match e.status() {
                Some(400) => AuthError::IncorrectCurrentPassword.into(),
                Some(404) => AuthError::UserNotFound.into(),
                Some(401) | Some(422) => AuthError::SessionExpired.into(),
                _ => e,
            })?;

        Ok(())
    }

    async fn logout(&self, session: &AuthSession) -> Result<(), AppError> {
        let Some(token) = session.token.clone() else {
            return Ok(());
        };

        let client = self.client.clone().with_token(Some(token));
        client.send_json(Method::POST, "auth/logout", &json!({})).await?;
        Ok(())
    }
}
