use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::json;
use std::path::Path;

use super::models::{Course, ImportSummary, Instructor, User};
use super::{extract_field, ApiClient};
use crate::error::AppError;
use crate::forms::{validate_import_file, CourseForm, ResetPasswordForm, UserForm};

impl ApiClient {
    pub async fn admin_courses(&self) -> Result<Vec<Course>, AppError> {
        self.get_field("admin/courses", "courses").await
    }

    pub async fn admin_instructors(&self) -> Result<Vec<Instructor>, AppError> {
        self.get_field("admin/instructors", "instructors").await
    }

    pub async fn create_course(&self, form: &CourseForm) -> Result<Course, AppError> {
        form.validate()?;
        let body = self.send_json(Method::POST, "admin/courses", form).await?;
        extract_field(body, "course")
    }

    pub async fn update_course(&self, id: i64, form: &CourseForm) -> Result<Course, AppError> {
        form.validate()?;
        let body = self
            .send_json(Method::PUT, &format!("admin/courses/{}", id), form)
            .await?;
        extract_field(body, "course")
    }

    pub async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        self.delete(&format!("admin/courses/{}", id)).await
    }

    pub async fn admin_users(&self) -> Result<Vec<User>, AppError> {
        self.get_field("admin/users", "users").await
    }

    pub async fn create_user(&self, form: &UserForm) -> Result<User, AppError> {
        form.validate()?;
        let body = self.send_json(Method::POST, "admin/users", form).await?;
        extract_field(body, "user")
    }

    pub async fn update_user(&self, id: i64, form: &UserForm) -> Result<User, AppError> {
        form.validate()?;
        let body = self
            .send_json(Method::PUT, &format!("admin/users/{}", id), form)
            .await?;
        extract_field(body, "user")
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        self.delete(&format!("admin/users/{}", id)).await
    }

    pub async fn reset_password(&self, id: i64, form: &ResetPasswordForm) -> Result<(), AppError> {
        form.validate()?;
        self.send_json(
            Method::POST,
            &format!("admin/users/{}/reset-password", id),
            &json!({ "newPassword": form.new_password }),
        )
        .await?;
        Ok(())
    }

    pub async fn semesters(&self) -> Result<Vec<String>, AppError> {
        self.get_field("admin/semesters", "semesters").await
    }

    /// Upload a student roster (CSV or Excel) as multipart `file`
    pub async fn import_students(&self, path: &Path) -> Result<ImportSummary, AppError> {
        validate_import_file(path)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::validation(format!("Cannot read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("students.csv")
            .to_string();

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let builder = self.request(Method::POST, "admin/import-students")?.multipart(form);
        let summary = self.send(builder).await?.json().await?;
        Ok(summary)
    }
}
