//! Field-level validation for the admin, password and reply forms.
//!
//! Each form validates into a `ValidationError` carrying one message per
//! offending field, so callers can show them inline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ValidationError;
use crate::types::Role;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Accepted spreadsheet formats for the student import
pub const IMPORT_EXTENSIONS: [&str; 2] = ["csv", "xlsx"];

/// Collects field errors and turns them into a result
#[derive(Debug, Default)]
struct FieldCheck {
    error: Option<ValidationError>,
}

impl FieldCheck {
    fn fail(&mut self, field: &str, message: &str) {
        let error = self
            .error
            .take()
            .unwrap_or_else(|| ValidationError::new("Please correct the highlighted fields"));
        self.error = Some(error.with_field(field, message));
    }

    fn required(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.fail(field, message);
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseForm {
    pub code: String,
    pub name: String,
    pub semester: String,
    pub instructor_id: Option<i64>,
}

impl CourseForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut check = FieldCheck::default();
        check.required("code", &self.code, "Course code is required");
        check.required("name", &self.name, "Course name is required");
        check.required("semester", &self.semester, "Semester is required");
        if self.instructor_id.is_none() {
            check.fail("instructorId", "Please choose an instructor");
        }
        check.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

impl UserForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut check = FieldCheck::default();
        check.required("name", &self.name, "Full name is required");

        if self.email.trim().is_empty() {
            check.fail("email", "Email is required");
        } else if !is_valid_email(&self.email) {
            check.fail("email", "Email is invalid");
        }

        match self.role {
            None | Some(Role::Unknown) => check.fail("role", "Please choose a role"),
            Some(Role::Student) => {
                let student_id = self.student_id.as_deref().unwrap_or("");
                check.required("studentId", student_id, "Student ID is required");
            }
            Some(_) => {}
        }

        check.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordForm {
    pub new_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut check = FieldCheck::default();
        check_new_password(&mut check, "newPassword", &self.new_password);
        check.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut check = FieldCheck::default();
        check.required("currentPassword", &self.current_password, "Current password is required");
        check_new_password(&mut check, "newPassword", &self.new_password);

        if self.confirm_password.is_empty() {
            check.fail("confirmPassword", "Please confirm the new password");
        } else if self.confirm_password != self.new_password {
            check.fail("confirmPassword", "Passwords do not match");
        }

        check.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyForm {
    pub reply: String,
}

impl ReplyForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut check = FieldCheck::default();
        check.required("reply", &self.reply, "Please enter a reply");
        check.finish()
    }
}

/// Only CSV and Excel files can be imported
pub fn validate_import_file(path: &Path) -> Result<(), ValidationError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) if IMPORT_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ValidationError::new("Only CSV or Excel files are supported")
            .with_field("file", format!("Unsupported file: {}", path.display()))),
    }
}

fn check_new_password(check: &mut FieldCheck, field: &str, password: &str) {
    if password.is_empty() {
        check.fail(field, "New password is required");
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        check.fail(field, "Password must be at least 6 characters");
    }
}

/// Shape check only: one `@`, a local part, and a dotted domain without spaces
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}
