// Wire types for the evaluation backend (camelCase JSON)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::evaluation::{Evaluation, EvaluationDraft, RatingCategory};
use crate::types::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub semester: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub instructor_id: Option<i64>,
    #[serde(default)]
    pub evaluation_count: u32,
    #[serde(default)]
    pub student_count: u32,
    #[serde(default)]
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub student_id: Option<String>,
}

/// Course as listed on the student dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCourse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub semester: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub is_evaluated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentCourseDetail {
    pub course: StudentCourse,
    #[serde(default)]
    pub evaluation: Option<EvaluationDraft>,
}

/// Course as listed on the instructor dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorCourse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub semester: String,
    #[serde(default)]
    pub students: u32,
    #[serde(default)]
    pub evaluations_completed: u32,
    #[serde(default)]
    pub evaluation_rate: f64,
    #[serde(default)]
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorCourseSummary {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub semester: String,
    #[serde(default)]
    pub student_count: u32,
    #[serde(default)]
    pub evaluation_count: u32,
    #[serde(default)]
    pub average_ratings: BTreeMap<RatingCategory, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorCourseDetail {
    pub course: InstructorCourseSummary,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
}

/// One line of the course or instructor report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub course_count: Option<u32>,
    #[serde(default)]
    pub evaluation_count: u32,
    #[serde(default)]
    pub student_count: u32,
    #[serde(default)]
    pub category_ratings: BTreeMap<RatingCategory, f64>,
    #[serde(default)]
    pub average_rating: f64,
}

impl ReportRow {
    /// Share of enrolled students who submitted, in percent
    pub fn completion_rate(&self) -> f64 {
        if self.student_count == 0 {
            return 0.0;
        }
        f64::from(self.evaluation_count) / f64::from(self.student_count) * 100.0
    }

    pub fn category_rating(&self, category: RatingCategory) -> f64 {
        self.category_ratings.get(&category).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row: u32,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: u32,
    pub success: u32,
    pub failed: u32,
    #[serde(default)]
    pub errors: Vec<ImportRowError>,
}
