use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{AuthService, AuthSession};
use crate::error::{AppError, AuthError};
use crate::types::{Identity, Role};

#[derive(Debug, Clone)]
struct MockAccount {
    identity: Identity,
    password: String,
}

/// In-memory credential store standing in for the backend during development
pub struct MockAuthService {
    accounts: RwLock<Vec<MockAccount>>,
    latency: Duration,
}

impl MockAuthService {
    /// Seeded development accounts with the given simulated network delay
    pub fn new(latency: Duration) -> Self {
        let seed = [
            (1, "Admin User", "admin@example.com", "admin123", Role::Admin),
            (2, "Instructor User", "instructor@example.com", "instructor123", Role::Instructor),
            (3, "Student User", "student@example.com", "student123", Role::Student),
        ];

        let accounts = seed
            .into_iter()
            .map(|(id, name, email, password, role)| MockAccount {
                identity: Identity::new(id, name, email, role),
                password: password.to_string(),
            })
            .collect();

        Self {
            accounts: RwLock::new(accounts),
            latency,
        }
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(config.session.simulated_latency())
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MockAuthService {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl AuthService for MockAuthService {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        self.simulate_latency().await;

        let accounts = self.accounts.read().await;
        let account = accounts
            .iter()
            .find(|a| a.identity.email == email && a.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        // Password never leaves the store
        Ok(AuthSession::without_token(account.identity.clone()))
    }

    async fn change_password(
        &self,
        session: &AuthSession,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        self.simulate_latency().await;

        let mut accounts = self.accounts.write().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.identity.id == session.identity.id)
            .ok_or(AuthError::UserNotFound)?;

        if account.password != current_password {
            return Err(AuthError::IncorrectCurrentPassword.into());
        }

        account.password = new_password.to_string();
        tracing::debug!("Mock password updated for user {}", account.identity.id);
        Ok(())
    }
}
