#![allow(dead_code)]

//! In-process stand-in for the evaluation REST backend.
//!
//! Each test gets its own backend on a fresh port with seeded users, courses
//! and one prior evaluation. Requests under /api/admin, /api/student and
//! /api/instructor need a bearer token issued by /api/auth/login.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use course_eval::api::ApiClient;
use course_eval::auth::HttpAuthService;
use course_eval::session::storage::MemoryStorage;
use course_eval::session::SessionStore;

pub const JWT_SECRET: &[u8] = b"mock-backend-secret";
pub const CATEGORIES: [&str; 5] = ["content", "materials", "instructor", "facilities", "support"];

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub student_id: Option<String>,
    pub password: String,
    pub first_login: bool,
}

impl UserRecord {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "role": self.role,
            "studentId": self.student_id,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub semester: String,
    pub instructor_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub id: i64,
    pub course_id: i64,
    pub student_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub ratings: BTreeMap<String, u8>,
    pub comments: BTreeMap<String, String>,
    pub general_comment: String,
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Spreadsheet with a server-chosen file name
    Named,
    /// Spreadsheet without Content-Disposition
    Anonymous,
    /// Misconfigured server answering JSON
    Json,
}

#[derive(Debug)]
pub struct Backend {
    pub users: Vec<UserRecord>,
    pub courses: Vec<CourseRecord>,
    pub evaluations: Vec<EvaluationRecord>,
    pub next_id: i64,
    pub export_mode: ExportMode,
    pub evaluate_calls: u32,
    pub logouts: u32,
}

impl Backend {
    fn seeded() -> Self {
        let user = |id: i64, name: &str, email: &str, role: &str, student_id: Option<&str>, password: &str| UserRecord {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            student_id: student_id.map(str::to_string),
            password: password.to_string(),
            first_login: false,
        };
        let course = |id: i64, code: &str, name: &str, semester: &str, instructor_id: i64| CourseRecord {
            id,
            code: code.to_string(),
            name: name.to_string(),
            semester: semester.to_string(),
            instructor_id: Some(instructor_id),
        };

        let mut fresh = user(4, "New Student", "new@example.com", "student", Some("SV002"), "initial1");
        fresh.first_login = true;

        Self {
            users: vec![
                user(1, "Admin User", "admin@example.com", "admin", None, "admin123"),
                user(2, "Instructor User", "instructor@example.com", "instructor", None, "instructor123"),
                user(3, "Student User", "student@example.com", "student", Some("SV001"), "student123"),
                fresh,
                user(5, "Second Instructor", "second@example.com", "instructor", None, "second123"),
            ],
            courses: vec![
                course(10, "CS101", "Intro to Programming", "2023-1", 2),
                course(11, "CS201", "Data Structures", "2023-1", 2),
                course(12, "CS301", "Databases", "2022-2", 5),
            ],
            evaluations: vec![EvaluationRecord {
                id: 100,
                course_id: 12,
                student_user_id: 3,
                created_at: Utc::now(),
                ratings: CATEGORIES.iter().map(|c| (c.to_string(), 4)).collect(),
                comments: CATEGORIES.iter().map(|c| (c.to_string(), String::new())).collect(),
                general_comment: "Solid course".to_string(),
                reply: None,
            }],
            next_id: 1000,
            export_mode: ExportMode::Named,
            evaluate_calls: 0,
            logouts: 0,
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == id)
    }

    fn student_count(&self) -> u32 {
        self.users.iter().filter(|u| u.role == "student").count() as u32
    }

    fn instructor_name(&self, course: &CourseRecord) -> Option<String> {
        course
            .instructor_id
            .and_then(|id| self.user(id))
            .map(|u| u.name.clone())
    }

    fn course_json(&self, course: &CourseRecord) -> Value {
        let evaluations: Vec<&EvaluationRecord> = self.evaluations_for(&[course.id]);
        let (_, average) = averages(&evaluations);
        json!({
            "id": course.id,
            "code": course.code,
            "name": course.name,
            "semester": course.semester,
            "instructor": self.instructor_name(course),
            "instructorId": course.instructor_id,
            "evaluationCount": evaluations.len(),
            "studentCount": self.student_count(),
            "averageRating": if evaluations.is_empty() { Value::Null } else { json!(average) },
        })
    }

    fn evaluations_for(&self, course_ids: &[i64]) -> Vec<&EvaluationRecord> {
        self.evaluations
            .iter()
            .filter(|e| course_ids.contains(&e.course_id))
            .collect()
    }
}

fn averages(evaluations: &[&EvaluationRecord]) -> (BTreeMap<String, f64>, f64) {
    if evaluations.is_empty() {
        return (BTreeMap::new(), 0.0);
    }

    let n = evaluations.len() as f64;
    let per_category: BTreeMap<String, f64> = CATEGORIES
        .iter()
        .map(|c| {
            let total: f64 = evaluations
                .iter()
                .map(|e| f64::from(e.ratings.get(*c).copied().unwrap_or(0)))
                .sum();
            (c.to_string(), total / n)
        })
        .collect();
    let overall = per_category.values().sum::<f64>() / per_category.len() as f64;
    (per_category, overall)
}

type Shared = Arc<Mutex<Backend>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token as the backend would issue it, valid for `ttl` (negative for already expired)
pub fn issue_token(user_id: i64, ttl: chrono::Duration) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET)).expect("token encodes")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn token_user_id(headers: &HeaderMap) -> Option<i64> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(JWT_SECRET), &Validation::default()).ok()?;
    data.claims.sub.parse().ok()
}

fn caller(backend: &Backend, headers: &HeaderMap, role: &str) -> Result<UserRecord, Response> {
    let user = token_user_id(headers)
        .and_then(|id| backend.user(id))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Missing or invalid token"))?;
    if user.role != role {
        return Err(error(StatusCode::FORBIDDEN, "Access denied"));
    }
    Ok(user.clone())
}

macro_rules! authorize {
    ($backend:expr, $headers:expr, $role:expr) => {
        match caller(&$backend, &$headers, $role) {
            Ok(user) => user,
            Err(response) => return response,
        }
    };
}

// ---------------------------------------------------------------- auth

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let backend = state.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match backend.users.iter().find(|u| u.email == email && u.password == password) {
        Some(user) => Json(json!({
            "access_token": issue_token(user.id, chrono::Duration::hours(1)),
            "first_login": user.first_login,
        }))
        .into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    let Some(id) = token_user_id(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Missing or invalid token");
    };
    match backend.user(id) {
        Some(user) => Json(user.to_json()).into_response(),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn change_password(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    let Some(id) = token_user_id(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Missing or invalid token");
    };
    let Some(user) = backend.users.iter_mut().find(|u| u.id == id) else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };
    if body["old_password"].as_str() != Some(user.password.as_str()) {
        return error(StatusCode::BAD_REQUEST, "Old password is incorrect");
    }
    user.password = body["new_password"].as_str().unwrap_or_default().to_string();
    user.first_login = false;
    Json(json!({ "message": "Password changed successfully" })).into_response()
}

async fn logout(State(state): State<Shared>) -> Response {
    state.lock().unwrap().logouts += 1;
    Json(json!({ "message": "Logged out" })).into_response()
}

// ---------------------------------------------------------------- admin

async fn admin_courses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");
    let courses: Vec<Value> = backend.courses.iter().map(|c| backend.course_json(c)).collect();
    Json(json!({ "courses": courses })).into_response()
}

fn apply_course(backend: &Backend, body: &Value, course: &mut CourseRecord) -> Result<(), Response> {
    let code = body["code"].as_str().unwrap_or_default().trim().to_string();
    if backend.courses.iter().any(|c| c.code == code && c.id != course.id) {
        return Err(error(StatusCode::BAD_REQUEST, "Course code already exists"));
    }
    course.code = code;
    course.name = body["name"].as_str().unwrap_or_default().to_string();
    course.semester = body["semester"].as_str().unwrap_or_default().to_string();
    course.instructor_id = body["instructorId"].as_i64();
    Ok(())
}

async fn create_course(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let mut course = CourseRecord {
        id: 0,
        code: String::new(),
        name: String::new(),
        semester: String::new(),
        instructor_id: None,
    };
    if let Err(response) = apply_course(&backend, &body, &mut course) {
        return response;
    }
    course.id = backend.next_id();
    let payload = backend.course_json(&course);
    backend.courses.push(course);
    (StatusCode::CREATED, Json(json!({ "course": payload }))).into_response()
}

async fn update_course(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let Some(mut course) = backend.courses.iter().find(|c| c.id == id).cloned() else {
        return error(StatusCode::NOT_FOUND, "Course not found");
    };
    if let Err(response) = apply_course(&backend, &body, &mut course) {
        return response;
    }
    let payload = backend.course_json(&course);
    if let Some(slot) = backend.courses.iter_mut().find(|c| c.id == id) {
        *slot = course;
    }
    Json(json!({ "course": payload })).into_response()
}

async fn delete_course(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let before = backend.courses.len();
    backend.courses.retain(|c| c.id != id);
    if backend.courses.len() == before {
        return error(StatusCode::NOT_FOUND, "Course not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn admin_instructors(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");
    let instructors: Vec<Value> = backend
        .users
        .iter()
        .filter(|u| u.role == "instructor")
        .map(|u| json!({ "id": u.id, "name": u.name }))
        .collect();
    Json(json!({ "instructors": instructors })).into_response()
}

async fn admin_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");
    let users: Vec<Value> = backend.users.iter().map(UserRecord::to_json).collect();
    Json(json!({ "users": users })).into_response()
}

fn apply_user(backend: &Backend, body: &Value, user: &mut UserRecord) -> Result<(), Response> {
    let email = body["email"].as_str().unwrap_or_default().trim().to_string();
    if backend.users.iter().any(|u| u.email == email && u.id != user.id) {
        return Err(error(StatusCode::BAD_REQUEST, "Email already exists"));
    }
    user.email = email;
    user.name = body["name"].as_str().unwrap_or_default().to_string();
    user.role = body["role"].as_str().unwrap_or_default().to_string();
    user.student_id = body["studentId"].as_str().map(str::to_string);
    Ok(())
}

async fn create_user(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let mut user = UserRecord {
        id: 0,
        name: String::new(),
        email: String::new(),
        role: String::new(),
        student_id: None,
        password: "changeme".to_string(),
        first_login: true,
    };
    if let Err(response) = apply_user(&backend, &body, &mut user) {
        return response;
    }
    user.id = backend.next_id();
    let payload = user.to_json();
    backend.users.push(user);
    (StatusCode::CREATED, Json(json!({ "user": payload }))).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let Some(mut user) = backend.user(id).cloned() else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };
    if let Err(response) = apply_user(&backend, &body, &mut user) {
        return response;
    }
    let payload = user.to_json();
    if let Some(slot) = backend.users.iter_mut().find(|u| u.id == id) {
        *slot = user;
    }
    Json(json!({ "user": payload })).into_response()
}

async fn delete_user(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let before = backend.users.len();
    backend.users.retain(|u| u.id != id);
    if backend.users.len() == before {
        return error(StatusCode::NOT_FOUND, "User not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn reset_password(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let password = body["newPassword"].as_str().unwrap_or_default().to_string();
    if password.len() < 6 {
        return error(StatusCode::BAD_REQUEST, "Password too short");
    }
    match backend.users.iter_mut().find(|u| u.id == id) {
        Some(user) => {
            user.password = password;
            user.first_login = true;
            Json(json!({ "message": "Password reset" })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn semesters(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");
    let mut semesters: Vec<String> = backend.courses.iter().map(|c| c.semester.clone()).collect();
    semesters.sort();
    semesters.dedup();
    semesters.reverse();
    Json(json!({ "semesters": semesters })).into_response()
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    #[serde(default)]
    semester: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl ReportQuery {
    fn semester_matches(&self, semester: &str) -> bool {
        match self.semester.as_deref() {
            None | Some("all") => true,
            Some(wanted) => wanted == semester,
        }
    }
}

async fn course_report(State(state): State<Shared>, headers: HeaderMap, Query(query): Query<ReportQuery>) -> Response {
    let backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let rows: Vec<Value> = backend
        .courses
        .iter()
        .filter(|c| query.semester_matches(&c.semester))
        .map(|course| {
            let evaluations = backend.evaluations_for(&[course.id]);
            let (categories, average) = averages(&evaluations);
            json!({
                "id": course.id,
                "name": format!("{} - {}", course.code, course.name),
                "instructor": backend.instructor_name(course),
                "evaluationCount": evaluations.len(),
                "studentCount": backend.student_count(),
                "categoryRatings": categories,
                "averageRating": average,
            })
        })
        .collect();
    Json(json!({ "courses": rows })).into_response()
}

async fn instructor_report(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Response {
    let backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let rows: Vec<Value> = backend
        .users
        .iter()
        .filter(|u| u.role == "instructor")
        .map(|instructor| {
            let course_ids: Vec<i64> = backend
                .courses
                .iter()
                .filter(|c| c.instructor_id == Some(instructor.id) && query.semester_matches(&c.semester))
                .map(|c| c.id)
                .collect();
            let evaluations = backend.evaluations_for(&course_ids);
            let (categories, average) = averages(&evaluations);
            json!({
                "id": instructor.id,
                "name": instructor.name,
                "courseCount": course_ids.len(),
                "evaluationCount": evaluations.len(),
                "studentCount": backend.student_count() * course_ids.len() as u32,
                "categoryRatings": categories,
                "averageRating": average,
            })
        })
        .collect();
    Json(json!({ "instructors": rows })).into_response()
}

pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const EXPORT_BYTES: &[u8] = b"PK\x03\x04mock-spreadsheet";

async fn export_report(State(state): State<Shared>, headers: HeaderMap, Query(query): Query<ReportQuery>) -> Response {
    let backend = state.lock().unwrap();
    authorize!(backend, headers, "admin");

    let kind = query.kind.clone().unwrap_or_default();
    if kind != "course" && kind != "instructor" {
        return error(StatusCode::BAD_REQUEST, "Unknown report type");
    }
    let semester = query.semester.clone().unwrap_or_else(|| "all".to_string());

    match backend.export_mode {
        ExportMode::Named => (
            [
                (header::CONTENT_TYPE, XLSX.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}-evaluations-{}.xlsx\"", kind, semester),
                ),
            ],
            EXPORT_BYTES,
        )
            .into_response(),
        ExportMode::Anonymous => ([(header::CONTENT_TYPE, XLSX)], EXPORT_BYTES).into_response(),
        ExportMode::Json => Json(json!({ "status": "queued" })).into_response(),
    }
}

async fn import_students(State(state): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    {
        let backend = state.lock().unwrap();
        authorize!(backend, headers, "admin");
    }

    let mut content = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            content = field.text().await.ok();
        }
    }
    let Some(content) = content else {
        return error(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let mut backend = state.lock().unwrap();
    let mut errors = Vec::new();
    let mut success = 0;
    let rows: Vec<&str> = content.lines().skip(1).filter(|l| !l.trim().is_empty()).collect();

    for (index, line) in rows.iter().enumerate() {
        let row = index + 2;
        let cols: Vec<&str> = line.split(',').map(str::trim).collect();
        let (name, email, student_id) = match cols.as_slice() {
            [name, email, student_id] if !email.is_empty() => (*name, *email, *student_id),
            _ => {
                errors.push(json!({ "row": row, "error": "Missing email" }));
                continue;
            }
        };
        if backend.users.iter().any(|u| u.email == email) {
            errors.push(json!({ "row": row, "error": "Email already exists" }));
            continue;
        }
        let id = backend.next_id();
        backend.users.push(UserRecord {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role: "student".to_string(),
            student_id: Some(student_id.to_string()),
            password: student_id.to_string(),
            first_login: true,
        });
        success += 1;
    }

    Json(json!({
        "total": rows.len(),
        "success": success,
        "failed": errors.len(),
        "errors": errors,
    }))
    .into_response()
}

// ---------------------------------------------------------------- student

fn student_course_json(backend: &Backend, course: &CourseRecord, student_id: i64) -> Value {
    json!({
        "id": course.id,
        "code": course.code,
        "name": course.name,
        "semester": course.semester,
        "instructor": backend.instructor_name(course),
        "schedule": "Mon 08:00-10:00",
        "isEvaluated": backend
            .evaluations
            .iter()
            .any(|e| e.course_id == course.id && e.student_user_id == student_id),
    })
}

async fn student_courses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    let student = authorize!(backend, headers, "student");
    let courses: Vec<Value> = backend
        .courses
        .iter()
        .map(|c| student_course_json(&backend, c, student.id))
        .collect();
    Json(json!({ "courses": courses })).into_response()
}

async fn student_course(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let backend = state.lock().unwrap();
    let student = authorize!(backend, headers, "student");

    let Some(course) = backend.courses.iter().find(|c| c.id == id) else {
        return error(StatusCode::NOT_FOUND, "Course not found");
    };
    let evaluation = backend
        .evaluations
        .iter()
        .find(|e| e.course_id == id && e.student_user_id == student.id)
        .map(|e| {
            json!({
                "ratings": e.ratings,
                "comments": e.comments,
                "generalComment": e.general_comment,
            })
        });

    Json(json!({
        "course": student_course_json(&backend, course, student.id),
        "evaluation": evaluation,
    }))
    .into_response()
}

async fn evaluate(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.evaluate_calls += 1;
    let student = authorize!(backend, headers, "student");

    if !backend.courses.iter().any(|c| c.id == id) {
        return error(StatusCode::NOT_FOUND, "Course not found");
    }
    if backend.evaluations.iter().any(|e| e.course_id == id && e.student_user_id == student.id) {
        return error(StatusCode::BAD_REQUEST, "You have already evaluated this course");
    }

    let mut ratings = BTreeMap::new();
    for category in CATEGORIES {
        match body["ratings"][category].as_u64() {
            Some(value @ 1..=5) => {
                ratings.insert(category.to_string(), value as u8);
            }
            _ => return error(StatusCode::BAD_REQUEST, "All categories must be rated"),
        }
    }
    let comments = CATEGORIES
        .iter()
        .map(|c| (c.to_string(), body["comments"][*c].as_str().unwrap_or_default().to_string()))
        .collect();

    let eval_id = backend.next_id();
    backend.evaluations.push(EvaluationRecord {
        id: eval_id,
        course_id: id,
        student_user_id: student.id,
        created_at: Utc::now(),
        ratings,
        comments,
        general_comment: body["generalComment"].as_str().unwrap_or_default().to_string(),
        reply: None,
    });

    (StatusCode::CREATED, Json(json!({ "message": "Evaluation submitted" }))).into_response()
}

// ---------------------------------------------------------------- instructor

async fn instructor_courses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    let instructor = authorize!(backend, headers, "instructor");

    let students = backend.student_count();
    let courses: Vec<Value> = backend
        .courses
        .iter()
        .filter(|c| c.instructor_id == Some(instructor.id))
        .map(|course| {
            let evaluations = backend.evaluations_for(&[course.id]);
            let (_, average) = averages(&evaluations);
            let rate = if students == 0 {
                0.0
            } else {
                evaluations.len() as f64 / f64::from(students) * 100.0
            };
            json!({
                "id": course.id,
                "code": course.code,
                "name": course.name,
                "semester": course.semester,
                "students": students,
                "evaluationsCompleted": evaluations.len(),
                "evaluationRate": rate,
                "averageRating": if evaluations.is_empty() { Value::Null } else { json!(average) },
            })
        })
        .collect();
    Json(json!({ "courses": courses })).into_response()
}

async fn instructor_course(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let backend = state.lock().unwrap();
    let instructor = authorize!(backend, headers, "instructor");

    let Some(course) = backend
        .courses
        .iter()
        .find(|c| c.id == id && c.instructor_id == Some(instructor.id))
    else {
        return error(StatusCode::NOT_FOUND, "Course not found");
    };

    let evaluations = backend.evaluations_for(&[course.id]);
    let (categories, _) = averages(&evaluations);
    let list: Vec<Value> = evaluations
        .iter()
        .map(|e| {
            let student_id = backend
                .user(e.student_user_id)
                .and_then(|u| u.student_id.clone())
                .unwrap_or_default();
            json!({
                "id": e.id,
                "studentId": student_id,
                "createdAt": e.created_at,
                "ratings": e.ratings,
                "comments": e.comments,
                "generalComment": e.general_comment,
                "instructorReply": e.reply,
            })
        })
        .collect();

    Json(json!({
        "course": {
            "id": course.id,
            "code": course.code,
            "name": course.name,
            "semester": course.semester,
            "studentCount": backend.student_count(),
            "evaluationCount": evaluations.len(),
            "averageRatings": categories,
        },
        "evaluations": list,
    }))
    .into_response()
}

async fn reply(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    let instructor = authorize!(backend, headers, "instructor");

    let text = body["reply"].as_str().unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Reply cannot be empty");
    }

    let owned: Vec<i64> = backend
        .courses
        .iter()
        .filter(|c| c.instructor_id == Some(instructor.id))
        .map(|c| c.id)
        .collect();
    match backend
        .evaluations
        .iter_mut()
        .find(|e| e.id == id && owned.contains(&e.course_id))
    {
        Some(evaluation) => {
            evaluation.reply = Some(text);
            Json(json!({ "message": "Reply saved" })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Evaluation not found"),
    }
}

// ---------------------------------------------------------------- harness

pub struct TestBackend {
    pub port: u16,
    pub base_url: String,
    pub state: Shared,
}

impl TestBackend {
    pub fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn client(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(&self.base_url, Duration::from_secs(5))?)
    }

    /// Session store logged in against this backend through the remote auth service
    pub async fn session(&self, email: &str, password: &str) -> Result<(SessionStore, Arc<MemoryStorage>)> {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(Arc::new(HttpAuthService::new(self.client()?)), storage.clone(), "user");
        store.restore();
        store.login(email, password).await?;
        Ok((store, storage))
    }

    /// API client carrying the token of a fresh login
    pub async fn client_as(&self, email: &str, password: &str) -> Result<ApiClient> {
        let (store, _) = self.session(email, password).await?;
        Ok(self.client()?.with_token(store.token()))
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/logout", post(logout))
        .route("/api/admin/courses", get(admin_courses).post(create_course))
        .route("/api/admin/courses/:id", put(update_course).delete(delete_course))
        .route("/api/admin/instructors", get(admin_instructors))
        .route("/api/admin/users", get(admin_users).post(create_user))
        .route("/api/admin/users/:id", put(update_user).delete(delete_user))
        .route("/api/admin/users/:id/reset-password", post(reset_password))
        .route("/api/admin/semesters", get(semesters))
        .route("/api/admin/reports/courses", get(course_report))
        .route("/api/admin/reports/instructors", get(instructor_report))
        .route("/api/admin/reports/export", get(export_report))
        .route("/api/admin/import-students", post(import_students))
        .route("/api/student/courses", get(student_courses))
        .route("/api/student/courses/:id", get(student_course))
        .route("/api/student/courses/:id/evaluate", post(evaluate))
        .route("/api/instructor/courses", get(instructor_courses))
        .route("/api/instructor/courses/:id", get(instructor_course))
        .route("/api/instructor/evaluations/:id/reply", post(reply))
        .with_state(state)
}

pub async fn spawn_backend() -> Result<TestBackend> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind mock backend")?;

    let state: Shared = Arc::new(Mutex::new(Backend::seeded()));
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(TestBackend {
        port,
        base_url: format!("http://127.0.0.1:{}/api", port),
        state,
    })
}
