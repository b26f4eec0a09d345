use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use crate::api::models::ReportRow;
use crate::api::reports::ReportKind;
use crate::cli::context::View;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::evaluation::RatingCategory;
use crate::listing::SemesterFilter;
use crate::routes::Route;

#[derive(Subcommand)]
pub enum ReportCommands {
    #[command(about = "Show course and instructor reports")]
    Show {
        #[arg(long, default_value = "all", help = "Semester, or all")]
        semester: SemesterFilter,
        #[arg(long = "type", help = "Only one report: course or instructor")]
        kind: Option<ReportKind>,
    },

    #[command(about = "Download a report as a spreadsheet")]
    Export {
        #[arg(long = "type", default_value = "course", help = "course or instructor")]
        kind: ReportKind,
        #[arg(long, default_value = "all", help = "Semester, or all")]
        semester: SemesterFilter,
        #[arg(long, default_value = ".", help = "Directory to save the file in")]
        output: PathBuf,
    },
}

fn print_rows(kind: ReportKind, rows: &[ReportRow]) {
    let title = match kind {
        ReportKind::Course => "COURSE",
        ReportKind::Instructor => "INSTRUCTOR",
    };

    print!("{:<6} {:<30}", "ID", title);
    for category in RatingCategory::ALL {
        print!(" {:>11}", category.label().to_uppercase());
    }
    println!(" {:>8} {:>11}", "AVG", "COMPLETION");
    println!("{}", "-".repeat(118));

    for row in rows {
        print!("{:<6} {:<30}", row.id, row.name);
        for category in RatingCategory::ALL {
            print!(" {:>11.1}", row.category_rating(category));
        }
        println!(" {:>8.1} {:>10.0}%", row.average_rating, row.completion_rate());
    }
}

pub async fn handle(cmd: ReportCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ReportCommands::Show { semester, kind } => {
            let view = View::enter(Route::Reports, output_format)?;
            let data = view
                .load(view.client.report_data(&semester), "Could not load reports")
                .await?;

            let kinds = match kind {
                Some(kind) => vec![kind],
                None => vec![ReportKind::Course, ReportKind::Instructor],
            };

            match view.output_format {
                OutputFormat::Json => {
                    let mut body = json!({ "semester": semester.as_query(), "semesters": data.semesters });
                    for kind in &kinds {
                        body[format!("{}s", kind)] = json!(data.rows(*kind));
                    }
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                OutputFormat::Text => {
                    println!("Semester: {} (available: {})", semester, data.semesters.join(", "));
                    for kind in kinds {
                        println!();
                        let rows = data.rows(kind);
                        if rows.is_empty() {
                            println!("No {} data", kind);
                        } else {
                            print_rows(kind, rows);
                        }
                    }
                }
            }
            Ok(())
        }
        ReportCommands::Export { kind, semester, output } => {
            let view = View::enter(Route::Reports, output_format)?;
            let export = view
                .load(view.client.export_report(kind, &semester), "Could not export report")
                .await?;

            if !output.exists() {
                tokio::fs::create_dir_all(&output).await?;
            }
            let path = output.join(&export.filename);
            tokio::fs::write(&path, &export.bytes).await?;

            output_success(
                &view.output_format,
                &format!("Saved {} report to {}", kind, path.display()),
                Some(json!({
                    "path": path.display().to_string(),
                    "content_type": export.content_type,
                    "bytes": export.bytes.len(),
                })),
            )
        }
    }
}
