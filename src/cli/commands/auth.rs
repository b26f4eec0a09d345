use clap::Subcommand;
use serde_json::json;

use crate::cli::config::open_session;
use crate::cli::context::View;
use crate::cli::utils::*;
use crate::cli::{OutputFormat, Reported};
use crate::config::config;
use crate::forms::ChangePasswordForm;
use crate::routes::{home_route, Route};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login with email and password")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the stored session")]
    Logout,

    #[command(about = "Show the logged-in user")]
    Whoami,

    #[command(about = "Change the current user's password")]
    ChangePassword {
        #[arg(long, help = "Current password (will prompt if not provided)")]
        current: Option<String>,
        #[arg(long = "new", help = "New password, at least 6 characters (will prompt if not provided)")]
        new_password: Option<String>,
        #[arg(long, help = "Repeat the new password (will prompt if not provided)")]
        confirm: Option<String>,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = prompt_if_missing(password, "Password")?;
            let session = open_session(config())?;

            let auth = match session.login(&email, &password).await {
                Ok(auth) => auth,
                Err(e) => {
                    output_app_error(&output_format, &e, "Login failed")?;
                    return Err(Reported(e.user_message("Login failed")).into());
                }
            };

            let identity = &auth.identity;
            let home = home_route(Some(&identity.role));
            output_success(
                &output_format,
                &format!("Logged in as {} ({})", identity.name, identity.role),
                Some(json!({
                    "user": identity,
                    "home": home.path(),
                    "first_login": auth.first_login,
                })),
            )?;

            if auth.first_login {
                if let OutputFormat::Text = output_format {
                    println!("Please change your initial password: evalctl auth change-password");
                }
            }

            Ok(())
        }
        AuthCommands::Logout => {
            let session = open_session(config())?;

            if session.identity().is_none() {
                return output_no_current_item(&output_format, "user");
            }

            session.logout().await?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Whoami => {
            let session = open_session(config())?;

            match session.identity() {
                Some(identity) => {
                    let details = json!({
                        "id": identity.id,
                        "name": identity.name,
                        "email": identity.email,
                        "role": identity.role.as_str(),
                        "home": home_route(Some(&identity.role)).path(),
                    });
                    output_current_item(&output_format, "user", &identity.name, details)
                }
                None => output_no_current_item(&output_format, "user"),
            }
        }
        AuthCommands::ChangePassword { current, new_password, confirm } => {
            let view = View::enter(Route::ChangePassword, output_format)?;

            let form = ChangePasswordForm {
                current_password: prompt_if_missing(current, "Current password")?,
                new_password: prompt_if_missing(new_password, "New password")?,
                confirm_password: prompt_if_missing(confirm, "Confirm new password")?,
            };

            view.load(
                async {
                    form.validate()?;
                    view.session
                        .change_password(&form.current_password, &form.new_password)
                        .await
                },
                "Could not change password",
            )
            .await?;

            output_success(&view.output_format, "Password changed", None)
        }
    }
}
