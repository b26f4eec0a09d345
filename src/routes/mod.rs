//! View table, role homes and guarded navigation.

pub mod guard;

use std::fmt;

use crate::session::SessionState;
use crate::types::Role;
pub use guard::{guard, GuardDecision};

const STUDENT_ONLY: &[Role] = &[Role::Student];
const INSTRUCTOR_ONLY: &[Role] = &[Role::Instructor];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Root,
    ChangePassword,
    StudentDashboard,
    CourseEvaluation(i64),
    InstructorDashboard,
    InstructorCourse(i64),
    AdminDashboard,
    CourseManagement,
    UserManagement,
    Reports,
    ImportStudents,
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or("");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Root,
            ["login"] => Route::Login,
            ["change-password"] => Route::ChangePassword,
            ["student"] => Route::StudentDashboard,
            ["student", "evaluate", id] => id.parse().map_or(Route::NotFound, Route::CourseEvaluation),
            ["instructor"] => Route::InstructorDashboard,
            ["instructor", "course", id] => id.parse().map_or(Route::NotFound, Route::InstructorCourse),
            ["admin"] => Route::AdminDashboard,
            ["admin", "courses"] => Route::CourseManagement,
            ["admin", "users"] => Route::UserManagement,
            ["admin", "reports"] => Route::Reports,
            ["admin", "import-students"] => Route::ImportStudents,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Root => "/".to_string(),
            Route::ChangePassword => "/change-password".to_string(),
            Route::StudentDashboard => "/student".to_string(),
            Route::CourseEvaluation(id) => format!("/student/evaluate/{}", id),
            Route::InstructorDashboard => "/instructor".to_string(),
            Route::InstructorCourse(id) => format!("/instructor/course/{}", id),
            Route::AdminDashboard => "/admin".to_string(),
            Route::CourseManagement => "/admin/courses".to_string(),
            Route::UserManagement => "/admin/users".to_string(),
            Route::Reports => "/admin/reports".to_string(),
            Route::ImportStudents => "/admin/import-students".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Login is the only view open without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login)
    }

    /// Roles allowed on this view; `None` means any signed-in user
    pub fn required_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::StudentDashboard | Route::CourseEvaluation(_) => Some(STUDENT_ONLY),
            Route::InstructorDashboard | Route::InstructorCourse(_) => Some(INSTRUCTOR_ONLY),
            Route::AdminDashboard
            | Route::CourseManagement
            | Route::UserManagement
            | Route::Reports
            | Route::ImportStudents => Some(ADMIN_ONLY),
            Route::Login | Route::Root | Route::ChangePassword | Route::NotFound => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Landing view for a role
pub fn home_route(role: Option<&Role>) -> Route {
    match role {
        Some(Role::Admin) => Route::AdminDashboard,
        Some(Role::Instructor) => Route::InstructorDashboard,
        Some(Role::Student) => Route::StudentDashboard,
        Some(Role::Unknown) | None => Route::Login,
    }
}

/// Resolve a requested path to the view that actually renders.
///
/// Redirects are followed; the root resolves to the user's home.
/// Returns `None` while the session is still loading.
pub fn navigate(state: &SessionState, path: &str) -> Option<Route> {
    let mut route = Route::parse(path);

    // Any chain ends at a role home or the login view within a few hops
    for _ in 0..4 {
        if route.is_public() {
            return Some(route);
        }

        match guard(state, route.required_roles()) {
            GuardDecision::Loading => return None,
            GuardDecision::Redirect(next) => route = next,
            GuardDecision::Render if route == Route::Root => {
                let home = home_route(state.identity().map(|i| &i.role));
                tracing::debug!("Root resolved to {}", home);
                route = home;
            }
            GuardDecision::Render => return Some(route),
        }
    }

    Some(Route::Login)
}
