use reqwest::Method;

use super::models::{InstructorCourse, InstructorCourseDetail};
use super::ApiClient;
use crate::error::AppError;
use crate::forms::ReplyForm;

impl ApiClient {
    pub async fn instructor_courses(&self) -> Result<Vec<InstructorCourse>, AppError> {
        self.get_field("instructor/courses", "courses").await
    }

    pub async fn instructor_course(&self, course_id: i64) -> Result<InstructorCourseDetail, AppError> {
        let builder = self.request(Method::GET, &format!("instructor/courses/{}", course_id))?;
        Ok(self.send(builder).await?.json().await?)
    }

    pub async fn reply_to_evaluation(&self, evaluation_id: i64, form: &ReplyForm) -> Result<(), AppError> {
        form.validate()?;
        self.send_json(
            Method::POST,
            &format!("instructor/evaluations/{}/reply", evaluation_id),
            form,
        )
        .await?;
        Ok(())
    }
}
