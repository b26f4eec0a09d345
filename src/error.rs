// Client error taxonomy
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::session::storage::StorageError;

/// Form-level validation failure with optional per-field messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.field_errors.insert(field.into(), message.into());
        self
    }

    pub fn field(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }
}

/// Authentication failures; none of these mutate session state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,

    #[error("User not found")]
    UserNotFound,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Invalid access token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Network or server failure. `from_server` marks messages taken from the response body.
    #[error("{message}")]
    RequestFailed {
        status: Option<u16>,
        message: String,
        from_server: bool,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Request cancelled")]
    Cancelled,
}

impl AppError {
    pub fn request_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::RequestFailed {
            status,
            message: message.into(),
            from_server: false,
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        AppError::RequestFailed {
            status: Some(status),
            message: message.into(),
            from_server: true,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::new(message))
    }

    /// HTTP status behind a request failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::RequestFailed { .. } => "REQUEST_FAILED",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Cancelled => "CANCELLED",
        }
    }

    /// Message to show the user. Server-provided and validation messages win over the fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::RequestFailed { message, from_server: true, .. } => message.clone(),
            AppError::RequestFailed { .. } | AppError::Storage(_) | AppError::Cancelled => fallback.to_string(),
            AppError::Validation(e) => e.message.clone(),
            AppError::Auth(e) => e.to_string(),
        }
    }

    /// JSON error body for `--json` output, with field errors and HTTP status when known
    pub fn to_json(&self, fallback: &str) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.user_message(fallback),
            "error_code": self.error_code()
        });

        match self {
            AppError::Validation(e) if !e.field_errors.is_empty() => {
                response["field_errors"] = json!(e.field_errors);
            }
            AppError::RequestFailed { status: Some(status), .. } => {
                response["status"] = json!(status);
            }
            _ => {}
        }

        response
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::warn!("HTTP request error: {}", err);
        AppError::request_failed(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::request_failed(None, format!("Invalid request URL: {}", err))
    }
}
