use serde_json::json;

use crate::cli::config::open_session;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::routes::{navigate, Route};

/// Show which view a path ends up on for the current session
pub async fn handle(path: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let session = open_session(config())?;
    let state = session.state();
    let requested = path.unwrap_or_else(|| "/".to_string());

    let resolved = navigate(&state, &requested).unwrap_or(Route::Login);
    let details = json!({
        "requested": requested,
        "route": resolved.path(),
        "user": state.identity(),
    });

    output_value(&output_format, "navigation", details, || {
        if resolved == Route::parse(&requested) {
            println!("{} renders", resolved);
        } else {
            println!("{} redirects to {}", requested, resolved);
        }
    })
}
