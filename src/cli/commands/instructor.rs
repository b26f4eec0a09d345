use clap::Subcommand;
use serde_json::json;

use crate::cli::context::View;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::evaluation::{RatingCategory, StarRating};
use crate::forms::ReplyForm;
use crate::listing::{filter_instructor_courses, SemesterFilter};
use crate::routes::Route;

#[derive(Subcommand)]
pub enum InstructorCommands {
    #[command(about = "List taught courses with evaluation progress")]
    Courses {
        #[arg(long, default_value = "all", help = "Semester, or all")]
        semester: SemesterFilter,
    },

    #[command(about = "Show a course's ratings and student feedback")]
    Show {
        #[arg(help = "Course ID")]
        course_id: i64,
    },

    #[command(about = "Reply to a student's evaluation")]
    Reply {
        #[arg(help = "Course ID the evaluation belongs to")]
        course_id: i64,
        #[arg(help = "Evaluation ID")]
        evaluation_id: i64,
        #[arg(help = "Reply text")]
        reply: String,
    },
}

pub async fn handle(cmd: InstructorCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InstructorCommands::Courses { semester } => {
            let view = View::enter(Route::InstructorDashboard, output_format)?;
            let courses = view
                .load(view.client.instructor_courses(), "Could not load your courses")
                .await?;

            let shown = filter_instructor_courses(&courses, &semester);
            if shown.is_empty() {
                return output_empty_collection(&view.output_format, "courses", "No courses found");
            }

            output_value(&view.output_format, "courses", json!(shown), || {
                println!("{:<6} {:<10} {:<35} {:<10} {:>9} {:>8} {:>7}", "ID", "CODE", "NAME", "SEMESTER", "STUDENTS", "RATE", "AVG");
                println!("{}", "-".repeat(92));
                for course in &shown {
                    let average = course
                        .average_rating
                        .map_or_else(|| "-".to_string(), |r| format!("{:.1}", r));
                    println!(
                        "{:<6} {:<10} {:<35} {:<10} {:>9} {:>7.0}% {:>7}",
                        course.id,
                        course.code,
                        course.name,
                        course.semester,
                        course.students,
                        course.evaluation_rate,
                        average
                    );
                }
            })
        }
        InstructorCommands::Show { course_id } => {
            let view = View::enter(Route::InstructorCourse(course_id), output_format)?;
            let detail = view
                .load(view.client.instructor_course(course_id), "Could not load course details")
                .await?;

            output_value(&view.output_format, "course", json!(detail), || {
                let course = &detail.course;
                println!("{} {} ({})", course.code, course.name, course.semester);
                println!(
                    "Evaluations: {} of {} students",
                    course.evaluation_count, course.student_count
                );
                for category in RatingCategory::ALL {
                    if let Some(average) = course.average_ratings.get(&category) {
                        println!("  {:<12} {:.1}", category.label(), average);
                    }
                }

                if detail.evaluations.is_empty() {
                    println!("\nNo evaluations yet");
                }
                for evaluation in &detail.evaluations {
                    println!(
                        "\n#{} {} ({})",
                        evaluation.id,
                        evaluation.student_id,
                        evaluation.created_at.format("%Y-%m-%d")
                    );
                    for category in RatingCategory::ALL {
                        let value = evaluation.ratings.get(&category).copied().unwrap_or(0);
                        println!("  {:<12} {}", category.label(), StarRating::new(value, true).render());
                    }
                    for (category, comment) in evaluation.non_empty_comments() {
                        println!("  {}: {}", category.label(), comment);
                    }
                    if let Some(general) = evaluation.general_comment.as_deref().filter(|c| !c.trim().is_empty()) {
                        println!("  General: {}", general);
                    }
                    match &evaluation.instructor_reply {
                        Some(reply) => println!("  Reply: {}", reply),
                        None => println!("  (no reply) evalctl instructor reply {} {} \"...\"", course_id, evaluation.id),
                    }
                }
            })
        }
        InstructorCommands::Reply { course_id, evaluation_id, reply } => {
            let view = View::enter(Route::InstructorCourse(course_id), output_format)?;
            let form = ReplyForm { reply };

            view.load(
                view.client.reply_to_evaluation(evaluation_id, &form),
                "Could not send reply",
            )
            .await?;

            output_success(
                &view.output_format,
                "Reply sent",
                Some(json!({ "evaluation_id": evaluation_id, "reply": form.reply })),
            )
        }
    }
}
