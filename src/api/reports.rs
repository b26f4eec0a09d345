use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::models::ReportRow;
use super::ApiClient;
use crate::error::AppError;
use crate::listing::SemesterFilter;

/// Content types accepted as a spreadsheet download
const SPREADSHEET_TYPES: [&str; 4] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/octet-stream",
    "text/csv",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Course,
    Instructor,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Course => "course",
            ReportKind::Instructor => "instructor",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "course" | "courses" => Ok(ReportKind::Course),
            "instructor" | "instructors" => Ok(ReportKind::Instructor),
            other => Err(format!("unknown report type '{}' (expected course or instructor)", other)),
        }
    }
}

/// Everything the reports screen shows for one semester selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub semesters: Vec<String>,
    pub courses: Vec<ReportRow>,
    pub instructors: Vec<ReportRow>,
}

impl ReportData {
    pub fn rows(&self, kind: ReportKind) -> &[ReportRow] {
        match kind {
            ReportKind::Course => &self.courses,
            ReportKind::Instructor => &self.instructors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportExport {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ApiClient {
    pub async fn course_report(&self, semester: &SemesterFilter) -> Result<Vec<ReportRow>, AppError> {
        self.get_field_with_query("admin/reports/courses", &[("semester", semester.as_query())], "courses")
            .await
    }

    pub async fn instructor_report(&self, semester: &SemesterFilter) -> Result<Vec<ReportRow>, AppError> {
        self.get_field_with_query(
            "admin/reports/instructors",
            &[("semester", semester.as_query())],
            "instructors",
        )
        .await
    }

    /// Semesters plus both reports, fetched concurrently; any failure fails the whole load
    pub async fn report_data(&self, semester: &SemesterFilter) -> Result<ReportData, AppError> {
        let (semesters, courses, instructors) = futures::try_join!(
            self.semesters(),
            self.course_report(semester),
            self.instructor_report(semester),
        )?;

        Ok(ReportData {
            semesters,
            courses,
            instructors,
        })
    }

    /// Download the server-built spreadsheet
    pub async fn export_report(&self, kind: ReportKind, semester: &SemesterFilter) -> Result<ReportExport, AppError> {
        let builder = self
            .request(Method::GET, "admin/reports/export")?
            .query(&[("type", kind.as_str()), ("semester", semester.as_query())]);
        let response = self.send(builder).await?;

        let content_type = header_str(&response, CONTENT_TYPE.as_str()).unwrap_or_default();
        if !is_spreadsheet(&content_type) {
            return Err(AppError::request_failed(
                Some(response.status().as_u16()),
                format!("Export returned unexpected content type '{}'", content_type),
            ));
        }

        let filename = export_filename(
            header_str(&response, CONTENT_DISPOSITION.as_str()).as_deref(),
            kind,
            semester,
        );
        let bytes = response.bytes().await?.to_vec();
        tracing::info!("Exported {} report ({} bytes) as {}", kind, bytes.len(), filename);

        Ok(ReportExport {
            filename,
            content_type,
            bytes,
        })
    }
}

fn header_str(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn is_spreadsheet(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    SPREADSHEET_TYPES.contains(&mime.as_str())
}

/// Server-named file when `Content-Disposition` carries one, else `<type>_report_<semester>.xlsx`
pub fn export_filename(disposition: Option<&str>, kind: ReportKind, semester: &SemesterFilter) -> String {
    disposition
        .and_then(disposition_filename)
        .unwrap_or_else(|| format!("{}_report_{}.xlsx", kind, semester.as_query()))
}

fn disposition_filename(disposition: &str) -> Option<String> {
    let raw = disposition.split(';').map(str::trim).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim().eq_ignore_ascii_case("filename").then(|| value.trim())
    })?;

    // Never let the server pick a directory
    let name = raw
        .trim_matches('"')
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}
