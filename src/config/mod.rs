use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

/// Which authentication service backs the session store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthBackend {
    Mock,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub auth_backend: AuthBackend,
    pub storage_key: String,
    pub simulated_latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub min_rating_without_comment: u8,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SessionConfig {
    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("EVAL_API_URL") {
            self.api.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("EVAL_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }

        // Session overrides
        if let Ok(v) = env::var("EVAL_AUTH_BACKEND") {
            self.session.auth_backend = match v.to_ascii_lowercase().as_str() {
                "mock" => AuthBackend::Mock,
                "remote" | "http" => AuthBackend::Remote,
                _ => self.session.auth_backend,
            };
        }
        if let Ok(v) = env::var("EVAL_SESSION_KEY") {
            if !v.trim().is_empty() {
                self.session.storage_key = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("EVAL_SIMULATED_LATENCY_MS") {
            self.session.simulated_latency_ms = v.parse().unwrap_or(self.session.simulated_latency_ms);
        }

        // Evaluation overrides
        if let Ok(v) = env::var("EVAL_MIN_RATING_WITHOUT_COMMENT") {
            self.evaluation.min_rating_without_comment = v
                .parse()
                .ok()
                .filter(|n| (1..=5).contains(n))
                .unwrap_or(self.evaluation.min_rating_without_comment);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:5000/api".to_string(),
                request_timeout_secs: 30,
            },
            session: SessionConfig {
                auth_backend: AuthBackend::Mock,
                storage_key: "user".to_string(),
                simulated_latency_ms: 500,
            },
            evaluation: EvaluationConfig {
                min_rating_without_comment: 3,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.example.com/api".to_string(),
                request_timeout_secs: 15,
            },
            session: SessionConfig {
                auth_backend: AuthBackend::Remote,
                storage_key: "user".to_string(),
                simulated_latency_ms: 0,
            },
            evaluation: EvaluationConfig {
                min_rating_without_comment: 3,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://app.example.com/api".to_string(),
                request_timeout_secs: 10,
            },
            session: SessionConfig {
                auth_backend: AuthBackend::Remote,
                storage_key: "user".to_string(),
                simulated_latency_ms: 0,
            },
            evaluation: EvaluationConfig {
                min_rating_without_comment: 3,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
