//! HTTP client for the evaluation REST backend.
//!
//! Every call re-fetches; nothing is cached between commands. Endpoint groups
//! live in the role submodules, which all go through the helpers below.

pub mod admin;
pub mod instructor;
pub mod models;
pub mod reports;
pub mod student;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url)?;

        // Url::join drops the last path segment unless it ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(&config.api.base_url, config.api.request_timeout())
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AppError> {
        let url = self.endpoint(path)?;
        tracing::debug!("{} {}", method, url);

        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response, AppError> {
        let response = builder.send().await?;
        check_status(response).await
    }

    /// GET a JSON body and pull one top-level field out of it
    pub(crate) async fn get_field<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &str,
    ) -> Result<T, AppError> {
        let builder = self.request(Method::GET, path)?;
        let body: Value = self.send(builder).await?.json().await?;
        extract_field(body, field)
    }

    pub(crate) async fn get_field_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        field: &str,
    ) -> Result<T, AppError> {
        let builder = self.request(Method::GET, path)?.query(query);
        let body: Value = self.send(builder).await?.json().await?;
        extract_field(body, field)
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, AppError> {
        let builder = self.request(method, path)?.json(body);
        let response = self.send(builder).await?;

        // Some endpoints answer 201/204 with an empty body
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| AppError::request_failed(None, format!("Malformed response body: {}", e)))
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), AppError> {
        let builder = self.request(Method::DELETE, path)?;
        self.send(builder).await?;
        Ok(())
    }
}

pub(crate) fn extract_field<T: DeserializeOwned>(mut body: Value, field: &str) -> Result<T, AppError> {
    let value = body
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| AppError::request_failed(None, format!("Malformed response: missing '{}'", field)))?;

    serde_json::from_value(value)
        .map_err(|e| AppError::request_failed(None, format!("Malformed '{}' in response: {}", field, e)))
}

/// Turn non-2xx responses into `RequestFailed`, keeping the server's message when it sent one
pub(crate) async fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!("Request failed with {}: {}", status, body);

    match server_message(&body) {
        Some(message) => Err(AppError::server(status.as_u16(), message)),
        None => Err(AppError::request_failed(
            Some(status.as_u16()),
            format!("Server responded with {}", status),
        )),
    }
}

fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}
