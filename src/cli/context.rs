use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::api::ApiClient;
use crate::cli::config::{api_client, open_session};
use crate::cli::utils::{output_app_error, ConsoleNotifier};
use crate::cli::OutputFormat;
use crate::config::{config, AppConfig};
use crate::error::AppError;
use crate::notify::Toast;
use crate::routes::{guard, home_route, GuardDecision, Route};
use crate::session::SessionStore;
use crate::view::ViewScope;

/// Failure already shown to the user as a notification
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Reported(pub String);

/// Everything a command needs once it has passed the route guard
pub struct View {
    pub route: Route,
    pub config: &'static AppConfig,
    pub session: SessionStore,
    pub client: ApiClient,
    pub scope: ViewScope,
    pub output_format: OutputFormat,
}

impl View {
    /// Restore the session and guard `route` against it
    pub fn enter(route: Route, output_format: OutputFormat) -> anyhow::Result<Self> {
        let config = config();
        let session = open_session(config)?;

        match guard(&session.state(), route.required_roles()) {
            GuardDecision::Render => {}
            GuardDecision::Redirect(Route::Login) | GuardDecision::Loading => {
                return Err(anyhow::anyhow!(
                    "Not logged in. Run `evalctl auth login <email>` first"
                ));
            }
            GuardDecision::Redirect(_) => {
                let role = session.identity().map(|i| i.role);
                let home = home_route(role.as_ref());
                return Err(anyhow::anyhow!(
                    "{} is not available to your account (home: {})",
                    route,
                    home
                ));
            }
        }

        let client = api_client(config, &session)?;
        let notifier = Arc::new(ConsoleNotifier::new(output_format.clone()));
        let scope = ViewScope::new(route.path(), notifier);

        Ok(Self {
            route,
            config,
            session,
            client,
            scope,
            output_format,
        })
    }

    pub fn threshold(&self) -> u8 {
        self.config.evaluation.min_rating_without_comment
    }

    /// Run a request; a failure is shown as an error toast and ends the command
    pub async fn load<F, T>(&self, request: F, fallback: &str) -> anyhow::Result<T>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let err = match self.scope.run(request).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if let AppError::Cancelled = err {
            return Err(Reported(fallback.to_string()).into());
        }

        tracing::warn!("{}: {}", self.scope.name(), err);
        let toast = Toast::from_error(&err, fallback);
        match (&self.output_format, &err) {
            (OutputFormat::Json, _) => output_app_error(&self.output_format, &err, fallback)?,
            (OutputFormat::Text, AppError::Validation(e)) => {
                self.scope.notifier().notify(toast.clone());
                for (field, message) in &e.field_errors {
                    eprintln!("  {}: {}", field, message);
                }
            }
            (OutputFormat::Text, _) => self.scope.notifier().notify(toast.clone()),
        }

        Err(Reported(toast.message).into())
    }
}
