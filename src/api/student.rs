use reqwest::Method;

use super::models::{StudentCourse, StudentCourseDetail};
use super::ApiClient;
use crate::error::AppError;
use crate::evaluation::EvaluationForm;

impl ApiClient {
    pub async fn student_courses(&self) -> Result<Vec<StudentCourse>, AppError> {
        self.get_field("student/courses", "courses").await
    }

    pub async fn student_course(&self, course_id: i64) -> Result<StudentCourseDetail, AppError> {
        let builder = self.request(Method::GET, &format!("student/courses/{}", course_id))?;
        Ok(self.send(builder).await?.json().await?)
    }

    /// Open the evaluation screen: read-only when the server already has a submission
    pub async fn evaluation_form(
        &self,
        course_id: i64,
        threshold: u8,
    ) -> Result<(StudentCourseDetail, EvaluationForm), AppError> {
        let mut detail = self.student_course(course_id).await?;
        let form = match detail.evaluation.take() {
            Some(existing) => EvaluationForm::submitted(course_id, existing, threshold),
            None => EvaluationForm::new(course_id, threshold),
        };
        Ok((detail, form))
    }

    /// Validates locally before anything goes over the wire
    pub async fn submit_evaluation(&self, form: &EvaluationForm) -> Result<(), AppError> {
        let body = form.submission()?;
        self.send_json(
            Method::POST,
            &format!("student/courses/{}/evaluate", form.course_id),
            body,
        )
        .await?;
        tracing::info!("Evaluation submitted for course {}", form.course_id);
        Ok(())
    }
}
