use clap::{Args, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use crate::api::models::{Course, User};
use crate::cli::context::View;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::error::AppError;
use crate::forms::{CourseForm, ResetPasswordForm, UserForm};
use crate::listing::{search_courses, search_users, RoleFilter, SemesterFilter};
use crate::routes::Route;
use crate::types::Role;

#[derive(Args)]
pub struct CourseArgs {
    #[arg(long, help = "Course code")]
    code: Option<String>,
    #[arg(long, help = "Course name")]
    name: Option<String>,
    #[arg(long, help = "Semester, e.g. 2023-1")]
    semester: Option<String>,
    #[arg(long = "instructor", help = "Instructor ID (see `evalctl admin instructors`)")]
    instructor_id: Option<i64>,
}

impl CourseArgs {
    /// Overlay the given flags on an existing course (or an empty form)
    fn into_form(self, existing: Option<&Course>) -> CourseForm {
        let base = existing.map_or_else(CourseForm::default, |c| CourseForm {
            code: c.code.clone(),
            name: c.name.clone(),
            semester: c.semester.clone(),
            instructor_id: c.instructor_id,
        });

        CourseForm {
            code: self.code.unwrap_or(base.code),
            name: self.name.unwrap_or(base.name),
            semester: self.semester.unwrap_or(base.semester),
            instructor_id: self.instructor_id.or(base.instructor_id),
        }
    }
}

#[derive(Args)]
pub struct UserArgs {
    #[arg(long, help = "Full name")]
    name: Option<String>,
    #[arg(long, help = "Email address")]
    email: Option<String>,
    #[arg(long, help = "student, instructor or admin")]
    role: Option<Role>,
    #[arg(long, help = "Student ID (required for students)")]
    student_id: Option<String>,
}

impl UserArgs {
    fn into_form(self, existing: Option<&User>) -> UserForm {
        let role = self.role.or(existing.map(|u| u.role));
        let student_id = match role {
            Some(Role::Student) => self
                .student_id
                .or_else(|| existing.and_then(|u| u.student_id.clone())),
            _ => None,
        };

        UserForm {
            name: self
                .name
                .or_else(|| existing.map(|u| u.name.clone()))
                .unwrap_or_default(),
            email: self
                .email
                .or_else(|| existing.map(|u| u.email.clone()))
                .unwrap_or_default(),
            role,
            student_id,
        }
    }
}

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "List courses")]
    Courses {
        #[arg(long, default_value = "", help = "Match course name or code")]
        search: String,
        #[arg(long, default_value = "all", help = "Semester, or all")]
        semester: SemesterFilter,
    },

    #[command(about = "Create a course")]
    CreateCourse {
        #[command(flatten)]
        args: CourseArgs,
    },

    #[command(about = "Update a course; omitted fields keep their values")]
    UpdateCourse {
        #[arg(help = "Course ID")]
        id: i64,
        #[command(flatten)]
        args: CourseArgs,
    },

    #[command(about = "Delete a course")]
    DeleteCourse {
        #[arg(help = "Course ID")]
        id: i64,
    },

    #[command(about = "List instructors available for course assignment")]
    Instructors,

    #[command(about = "List users")]
    Users {
        #[arg(long, default_value = "", help = "Match name, email or student ID")]
        search: String,
        #[arg(long, default_value = "all", help = "student, instructor, admin or all")]
        role: RoleFilter,
    },

    #[command(about = "Create a user")]
    CreateUser {
        #[command(flatten)]
        args: UserArgs,
    },

    #[command(about = "Update a user; omitted fields keep their values")]
    UpdateUser {
        #[arg(help = "User ID")]
        id: i64,
        #[command(flatten)]
        args: UserArgs,
    },

    #[command(about = "Delete a user")]
    DeleteUser {
        #[arg(help = "User ID")]
        id: i64,
    },

    #[command(about = "Set a new password for a user")]
    ResetPassword {
        #[arg(help = "User ID")]
        id: i64,
        #[arg(long, help = "New password, at least 6 characters (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "List semesters known to the backend")]
    Semesters,

    #[command(about = "Import students from a .csv or .xlsx roster")]
    Import {
        #[arg(help = "Roster file")]
        file: PathBuf,
    },
}

/// Local lookup miss; the message is specific enough to show as-is
fn not_found(kind: &str, id: i64) -> AppError {
    AppError::validation(format!("{} {} not found", kind, id))
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Courses { search, semester } => {
            let view = View::enter(Route::CourseManagement, output_format)?;
            let courses = view.load(view.client.admin_courses(), "Could not load courses").await?;

            let shown = search_courses(&courses, &search, &semester);
            if shown.is_empty() {
                return output_empty_collection(&view.output_format, "courses", "No courses found");
            }

            output_value(&view.output_format, "courses", json!(shown), || {
                println!("{:<6} {:<10} {:<35} {:<10} {:<20} {:>6}", "ID", "CODE", "NAME", "SEMESTER", "INSTRUCTOR", "EVALS");
                println!("{}", "-".repeat(92));
                for course in &shown {
                    println!(
                        "{:<6} {:<10} {:<35} {:<10} {:<20} {:>6}",
                        course.id,
                        course.code,
                        course.name,
                        course.semester,
                        course.instructor.as_deref().unwrap_or("-"),
                        course.evaluation_count
                    );
                }
            })
        }
        AdminCommands::CreateCourse { args } => {
            let view = View::enter(Route::CourseManagement, output_format)?;
            let form = args.into_form(None);
            let course = view.load(view.client.create_course(&form), "Could not save course").await?;

            output_success(
                &view.output_format,
                &format!("Course {} created", course.code),
                Some(json!({ "course": course })),
            )
        }
        AdminCommands::UpdateCourse { id, args } => {
            let view = View::enter(Route::CourseManagement, output_format)?;
            let course = view
                .load(
                    async {
                        let courses = view.client.admin_courses().await?;
                        let existing = courses.iter().find(|c| c.id == id).ok_or_else(|| not_found("Course", id))?;
                        let form = args.into_form(Some(existing));
                        view.client.update_course(id, &form).await
                    },
                    "Could not save course",
                )
                .await?;

            output_success(
                &view.output_format,
                &format!("Course {} updated", course.code),
                Some(json!({ "course": course })),
            )
        }
        AdminCommands::DeleteCourse { id } => {
            let view = View::enter(Route::CourseManagement, output_format)?;
            view.load(view.client.delete_course(id), "Could not delete course").await?;
            output_success(&view.output_format, &format!("Course {} deleted", id), None)
        }
        AdminCommands::Instructors => {
            let view = View::enter(Route::CourseManagement, output_format)?;
            let instructors = view
                .load(view.client.admin_instructors(), "Could not load instructors")
                .await?;

            if instructors.is_empty() {
                return output_empty_collection(&view.output_format, "instructors", "No instructors found");
            }

            output_value(&view.output_format, "instructors", json!(instructors), || {
                println!("{:<6} {}", "ID", "NAME");
                println!("{}", "-".repeat(40));
                for instructor in &instructors {
                    println!("{:<6} {}", instructor.id, instructor.name);
                }
            })
        }
        AdminCommands::Users { search, role } => {
            let view = View::enter(Route::UserManagement, output_format)?;
            let users = view.load(view.client.admin_users(), "Could not load users").await?;

            let shown = search_users(&users, &search, role);
            if shown.is_empty() {
                return output_empty_collection(&view.output_format, "users", "No users found");
            }

            output_value(&view.output_format, "users", json!(shown), || {
                println!("{:<6} {:<25} {:<30} {:<12} {}", "ID", "NAME", "EMAIL", "ROLE", "STUDENT ID");
                println!("{}", "-".repeat(88));
                for user in &shown {
                    println!(
                        "{:<6} {:<25} {:<30} {:<12} {}",
                        user.id,
                        user.name,
                        user.email,
                        user.role,
                        user.student_id.as_deref().unwrap_or("-")
                    );
                }
            })
        }
        AdminCommands::CreateUser { args } => {
            let view = View::enter(Route::UserManagement, output_format)?;
            let form = args.into_form(None);
            let user = view.load(view.client.create_user(&form), "Could not save user").await?;

            output_success(
                &view.output_format,
                &format!("User {} created", user.email),
                Some(json!({ "user": user })),
            )
        }
        AdminCommands::UpdateUser { id, args } => {
            let view = View::enter(Route::UserManagement, output_format)?;
            let user = view
                .load(
                    async {
                        let users = view.client.admin_users().await?;
                        let existing = users.iter().find(|u| u.id == id).ok_or_else(|| not_found("User", id))?;
                        let form = args.into_form(Some(existing));
                        view.client.update_user(id, &form).await
                    },
                    "Could not save user",
                )
                .await?;

            output_success(
                &view.output_format,
                &format!("User {} updated", user.email),
                Some(json!({ "user": user })),
            )
        }
        AdminCommands::DeleteUser { id } => {
            let view = View::enter(Route::UserManagement, output_format)?;
            view.load(view.client.delete_user(id), "Could not delete user").await?;
            output_success(&view.output_format, &format!("User {} deleted", id), None)
        }
        AdminCommands::ResetPassword { id, password } => {
            let view = View::enter(Route::UserManagement, output_format)?;
            let form = ResetPasswordForm {
                new_password: prompt_if_missing(password, "New password")?,
            };

            view.load(view.client.reset_password(id, &form), "Could not reset password")
                .await?;
            output_success(&view.output_format, &format!("Password reset for user {}", id), None)
        }
        AdminCommands::Semesters => {
            let view = View::enter(Route::Reports, output_format)?;
            let semesters = view.load(view.client.semesters(), "Could not load semesters").await?;

            if semesters.is_empty() {
                return output_empty_collection(&view.output_format, "semesters", "No semesters found");
            }

            output_value(&view.output_format, "semesters", json!(semesters), || {
                for semester in &semesters {
                    println!("{}", semester);
                }
            })
        }
        AdminCommands::Import { file } => {
            let view = View::enter(Route::ImportStudents, output_format)?;
            let summary = view
                .load(view.client.import_students(&file), "Could not import students")
                .await?;

            output_success(
                &view.output_format,
                &format!(
                    "Imported {} of {} rows ({} failed)",
                    summary.success, summary.total, summary.failed
                ),
                Some(json!({ "result": summary })),
            )?;

            if let OutputFormat::Text = view.output_format {
                for error in &summary.errors {
                    println!("  row {}: {}", error.row, error.error);
                }
            }
            Ok(())
        }
    }
}
