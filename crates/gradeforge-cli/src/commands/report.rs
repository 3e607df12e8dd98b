//! The `gradeforge report` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gradeforge_core::parser;
use gradeforge_core::processor::{ProcessorConfig, SubmissionProcessor};
use gradeforge_core::report::{AcademicReport, ReportBuilder};
use gradeforge_core::traits::GradebookStore;
use gradeforge_evaluators::config::load_config_from;
use gradeforge_evaluators::create_evaluator;
use gradeforge_store::MemoryStore;

pub async fn execute(
    course_path: PathBuf,
    student_email: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let course = parser::parse_course(&course_path)?;

    let Some(student) = course.users.iter().find(|u| u.email == student_email) else {
        anyhow::bail!(
            "no user with email '{}' in {}",
            student_email,
            course_path.display()
        );
    };
    let student_id = student.id;

    let store: Arc<dyn GradebookStore> = Arc::new(MemoryStore::new());
    for user in &course.users {
        store.insert_user(user.clone()).await?;
    }
    for assignment in &course.assignments {
        store.insert_assignment(assignment.clone()).await?;
    }

    let evaluator = create_evaluator(&config.evaluator)?;
    let processor = SubmissionProcessor::new(
        Arc::clone(&store),
        evaluator,
        ProcessorConfig {
            attempt_policy: config.attempt_policy,
            parallelism: config.parallelism,
            ..ProcessorConfig::default()
        },
    );

    // Only this student's submissions matter for the report.
    let requests = course
        .submissions
        .iter()
        .filter(|r| r.student_id == student_id)
        .cloned()
        .collect();
    for result in processor.process_batch(requests).await {
        if let Err(e) = result {
            eprintln!("  submission rejected: {e:#}");
        }
    }

    let report = ReportBuilder::new(Arc::clone(&store))
        .build(student_id)
        .await?;
    print_report(&report);

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_report(report: &AcademicReport) {
    println!("Academic report: {}", report.student_name);
    println!("  Assignments attempted: {}", report.assignments_attempted);
    println!(
        "  Overall: {:.2}%  GPA: {:.2}",
        report.overall_percentage, report.gpa
    );

    if report.lines.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Assignment", "Score", "Max", "%", "Feedback"]);
    for line in &report.lines {
        table.add_row(vec![
            Cell::new(&line.assignment_title),
            Cell::new(line.score),
            Cell::new(line.max_marks),
            Cell::new(format!("{:.2}", line.percentage)),
            Cell::new(&line.feedback),
        ]);
    }
    println!("{table}");
}
