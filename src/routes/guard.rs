use super::Route;
use crate::session::SessionState;
use crate::types::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not restored yet; show a placeholder and do not navigate
    Loading,
    Render,
    Redirect(Route),
}

/// Decide whether a protected view may render for the current session.
///
/// No identity sends the user to the login view; an identity outside
/// `required_roles` is sent back to the root, which resolves to their home.
pub fn guard(state: &SessionState, required_roles: Option<&[Role]>) -> GuardDecision {
    let identity = match state {
        SessionState::Loading => return GuardDecision::Loading,
        SessionState::Anonymous => return GuardDecision::Redirect(Route::Login),
        SessionState::Authenticated(identity) => identity,
    };

    match required_roles {
        Some(roles) if !identity.has_role(roles) => {
            tracing::debug!("{} may not open this view as {}", identity.email, identity.role);
            GuardDecision::Redirect(Route::Root)
        }
        _ => GuardDecision::Render,
    }
}
