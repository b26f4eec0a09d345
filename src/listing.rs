//! Client-side filtering for the dashboard and management lists.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::api::models::{Course, InstructorCourse, StudentCourse, User};
use crate::types::Role;

/// Semester selector; `all` disables the filter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SemesterFilter {
    #[default]
    All,
    Only(String),
}

impl SemesterFilter {
    pub fn matches(&self, semester: &str) -> bool {
        match self {
            SemesterFilter::All => true,
            SemesterFilter::Only(wanted) => wanted == semester,
        }
    }

    /// Value sent in `?semester=` query strings
    pub fn as_query(&self) -> &str {
        match self {
            SemesterFilter::All => "all",
            SemesterFilter::Only(semester) => semester,
        }
    }
}

impl FromStr for SemesterFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(if s.is_empty() || s.eq_ignore_ascii_case("all") {
            SemesterFilter::All
        } else {
            SemesterFilter::Only(s.to_string())
        })
    }
}

impl fmt::Display for SemesterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    Evaluated,
    NotEvaluated,
}

impl StatusFilter {
    pub fn matches(&self, is_evaluated: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Evaluated => is_evaluated,
            StatusFilter::NotEvaluated => !is_evaluated,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "evaluated" => Ok(StatusFilter::Evaluated),
            "not-evaluated" | "pending" => Ok(StatusFilter::NotEvaluated),
            other => Err(format!("unknown status '{}' (expected all, evaluated, not-evaluated)", other)),
        }
    }
}

/// Role selector on the user management list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    All,
    Only(Role),
}

impl RoleFilter {
    pub fn matches(&self, role: Role) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Only(wanted) => *wanted == role,
        }
    }
}

impl FromStr for RoleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(RoleFilter::All);
        }
        match s.parse::<Role>() {
            Ok(Role::Unknown) | Err(_) => Err(format!("unknown role '{}'", s)),
            Ok(role) => Ok(RoleFilter::Only(role)),
        }
    }
}

/// Distinct values in first-seen order
pub fn unique_semesters<'a>(semesters: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    semesters
        .into_iter()
        .filter(|s| seen.insert(*s))
        .map(str::to_string)
        .collect()
}

pub fn filter_student_courses<'a>(
    courses: &'a [StudentCourse],
    status: StatusFilter,
    semester: &SemesterFilter,
) -> Vec<&'a StudentCourse> {
    courses
        .iter()
        .filter(|c| semester.matches(&c.semester) && status.matches(c.is_evaluated))
        .collect()
}

pub fn filter_instructor_courses<'a>(
    courses: &'a [InstructorCourse],
    semester: &SemesterFilter,
) -> Vec<&'a InstructorCourse> {
    courses.iter().filter(|c| semester.matches(&c.semester)).collect()
}

/// Case-insensitive match on course name or code within a semester
pub fn search_courses<'a>(courses: &'a [Course], term: &str, semester: &SemesterFilter) -> Vec<&'a Course> {
    let term = term.trim().to_lowercase();
    courses
        .iter()
        .filter(|c| semester.matches(&c.semester))
        .filter(|c| c.name.to_lowercase().contains(&term) || c.code.to_lowercase().contains(&term))
        .collect()
}

/// Case-insensitive match on name, email or student id within a role
pub fn search_users<'a>(users: &'a [User], term: &str, role: RoleFilter) -> Vec<&'a User> {
    let term = term.trim().to_lowercase();
    users
        .iter()
        .filter(|u| role.matches(u.role))
        .filter(|u| {
            u.name.to_lowercase().contains(&term)
                || u.email.to_lowercase().contains(&term)
                || u.student_id
                    .as_deref()
                    .map_or(false, |id| id.to_lowercase().contains(&term))
        })
        .collect()
}
