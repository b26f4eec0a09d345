use clap::Subcommand;
use serde_json::json;

use crate::cli::context::View;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::evaluation::{EvaluationForm, RatingCategory};
use crate::listing::{filter_student_courses, unique_semesters, SemesterFilter, StatusFilter};
use crate::routes::Route;

#[derive(Subcommand)]
pub enum StudentCommands {
    #[command(about = "List enrolled courses")]
    Courses {
        #[arg(long, default_value = "all", help = "all, evaluated or not-evaluated")]
        status: StatusFilter,
        #[arg(long, default_value = "all", help = "Semester, or all")]
        semester: SemesterFilter,
    },

    #[command(about = "Show a course and its evaluation, if submitted")]
    Show {
        #[arg(help = "Course ID")]
        course_id: i64,
    },

    #[command(about = "Submit an evaluation for a course")]
    Evaluate {
        #[arg(help = "Course ID")]
        course_id: i64,
        #[arg(long = "rating", value_parser = parse_rating, help = "CATEGORY=1..5, repeat for each category")]
        ratings: Vec<(RatingCategory, u8)>,
        #[arg(long = "comment", value_parser = parse_comment, help = "CATEGORY=TEXT, required for low ratings")]
        comments: Vec<(RatingCategory, String)>,
        #[arg(long, help = "General comment")]
        general: Option<String>,
    },
}

fn parse_rating(s: &str) -> Result<(RatingCategory, u8), String> {
    let (category, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=VALUE, got '{}'", s))?;
    let value = value
        .trim()
        .parse::<u8>()
        .map_err(|_| format!("rating for {} must be a number from 1 to 5", category))?;
    Ok((category.parse()?, value))
}

fn parse_comment(s: &str) -> Result<(RatingCategory, String), String> {
    let (category, text) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=TEXT, got '{}'", s))?;
    Ok((category.parse()?, text.to_string()))
}

fn print_form(form: &EvaluationForm) {
    for category in RatingCategory::ALL {
        let stars = form.star_rating(category).render();
        let comment = form.draft.comment(category);
        if comment.trim().is_empty() {
            println!("  {:<12} {}", category.label(), stars);
        } else {
            println!("  {:<12} {}  {}", category.label(), stars, comment);
        }
    }
    if !form.draft.general_comment.trim().is_empty() {
        println!("  General: {}", form.draft.general_comment);
    }
}

pub async fn handle(cmd: StudentCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        StudentCommands::Courses { status, semester } => {
            let view = View::enter(Route::StudentDashboard, output_format)?;
            let courses = view
                .load(view.client.student_courses(), "Could not load your courses")
                .await?;

            let shown = filter_student_courses(&courses, status, &semester);
            if shown.is_empty() {
                return output_empty_collection(&view.output_format, "courses", "No courses found");
            }

            let semesters = unique_semesters(courses.iter().map(|c| c.semester.as_str()));
            output_value(&view.output_format, "courses", json!(shown), || {
                println!("{:<6} {:<10} {:<35} {:<10} {:<20} {}", "ID", "CODE", "NAME", "SEMESTER", "INSTRUCTOR", "STATUS");
                println!("{}", "-".repeat(95));
                for course in &shown {
                    let status = if course.is_evaluated { "evaluated" } else { "pending" };
                    println!(
                        "{:<6} {:<10} {:<35} {:<10} {:<20} {}",
                        course.id,
                        course.code,
                        course.name,
                        course.semester,
                        course.instructor.as_deref().unwrap_or("-"),
                        status
                    );
                }
                println!("\nSemesters: {}", semesters.join(", "));
            })
        }
        StudentCommands::Show { course_id } => {
            let view = View::enter(Route::CourseEvaluation(course_id), output_format)?;
            let (detail, form) = view
                .load(view.client.evaluation_form(course_id, view.threshold()), "Could not load course")
                .await?;

            let evaluation = if form.view_only { Some(&form.draft) } else { None };
            output_value(
                &view.output_format,
                "course",
                json!({ "course": detail.course, "evaluation": evaluation }),
                || {
                    println!("{} {} ({})", detail.course.code, detail.course.name, detail.course.semester);
                    if let Some(instructor) = &detail.course.instructor {
                        println!("Instructor: {}", instructor);
                    }
                    if form.view_only {
                        println!("\nYour evaluation:");
                        print_form(&form);
                    } else {
                        println!("\nNot evaluated yet: evalctl student evaluate {} --rating content=5 ...", course_id);
                    }
                },
            )
        }
        StudentCommands::Evaluate { course_id, ratings, comments, general } => {
            let view = View::enter(Route::CourseEvaluation(course_id), output_format)?;
            let (_, mut form) = view
                .load(view.client.evaluation_form(course_id, view.threshold()), "Could not load course")
                .await?;

            view.load(
                async {
                    for (category, value) in ratings {
                        form.rate(category, value)?;
                    }
                    for (category, text) in comments {
                        form.comment(category, text)?;
                    }
                    if let Some(text) = general {
                        form.general_comment(text)?;
                    }
                    view.client.submit_evaluation(&form).await
                },
                "Could not submit evaluation",
            )
            .await?;

            output_success(
                &view.output_format,
                "Evaluation submitted",
                Some(json!({ "course_id": course_id, "evaluation": form.draft })),
            )?;
            if let OutputFormat::Text = view.output_format {
                print_form(&form);
            }
            Ok(())
        }
    }
}
