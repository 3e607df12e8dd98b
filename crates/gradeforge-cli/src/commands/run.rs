//! The `gradeforge run` command.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use gradeforge_core::analytics::{AnalyticsEngine, AssignmentAnalytics};
use gradeforge_core::insights::InsightConfig;
use gradeforge_core::model::Role;
use gradeforge_core::parser::{self, CourseFile};
use gradeforge_core::processor::{ProcessorConfig, SubmissionProcessor};
use gradeforge_core::report::ReportBuilder;
use gradeforge_core::traits::{AnswerEvaluator, GradebookStore};
use gradeforge_evaluators::config::load_config_from;
use gradeforge_evaluators::{create_evaluator, GradeforgeConfig};
use gradeforge_store::MemoryStore;

pub async fn execute(
    course_path: PathBuf,
    output: Option<PathBuf>,
    reports: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let courses = if course_path.is_dir() {
        parser::load_course_directory(&course_path)?
    } else {
        vec![parser::parse_course(&course_path)?]
    };

    let evaluator = create_evaluator(&config.evaluator)?;
    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());

    for course in &courses {
        grade_course(
            course,
            Arc::clone(&evaluator),
            &config,
            reports,
            &output_dir,
        )
        .await?;
    }

    Ok(())
}

async fn grade_course(
    course: &CourseFile,
    evaluator: Arc<dyn AnswerEvaluator>,
    config: &GradeforgeConfig,
    reports: bool,
    output_dir: &Path,
) -> Result<()> {
    let student_count = course
        .users
        .iter()
        .filter(|u| u.role == Role::Student)
        .count();
    eprintln!(
        "Grading '{}': {} students, {} assignments, {} submissions",
        course.name,
        student_count,
        course.assignments.len(),
        course.submissions.len()
    );

    let store: Arc<dyn GradebookStore> = Arc::new(MemoryStore::new());
    for user in &course.users {
        store.insert_user(user.clone()).await?;
    }
    for assignment in &course.assignments {
        store.insert_assignment(assignment.clone()).await?;
    }

    let processor = SubmissionProcessor::new(
        Arc::clone(&store),
        evaluator,
        ProcessorConfig {
            attempt_policy: config.attempt_policy,
            parallelism: config.parallelism,
            ..ProcessorConfig::default()
        },
    );

    let results = processor.process_batch(course.submissions.clone()).await;
    let mut graded = 0usize;
    for result in &results {
        match result {
            Ok(_) => graded += 1,
            Err(e) => eprintln!("  submission rejected: {e:#}"),
        }
    }
    eprintln!("Graded {graded}/{} submissions", results.len());

    let names: HashMap<Uuid, &str> = course
        .users
        .iter()
        .map(|u| (u.id, u.name.as_str()))
        .collect();

    std::fs::create_dir_all(output_dir)?;

    let engine = AnalyticsEngine::new(Arc::clone(&store), InsightConfig::default());
    for assignment in &course.assignments {
        let Some(analytics) = engine.regenerate(assignment.id).await? else {
            eprintln!(
                "\nAssignment '{}': no submissions, skipping analytics",
                assignment.title
            );
            continue;
        };

        print_analytics(&assignment.title, &analytics, &names);

        let path = output_dir.join(format!("analytics-{}.json", assignment.id));
        let json = serde_json::to_string_pretty(&analytics)?;
        std::fs::write(&path, json)?;
        eprintln!("Analytics saved to: {}", path.display());
    }

    if reports {
        save_reports(course, &store, output_dir).await?;
    }

    Ok(())
}

fn print_analytics(
    title: &str,
    analytics: &AssignmentAnalytics,
    names: &HashMap<Uuid, &str>,
) {
    let metrics = &analytics.metrics;
    let insights = &analytics.insights;

    println!("\nAssignment: {title}");
    println!("  {}", insights.summary);
    println!(
        "  Highest {:.0}, lowest {:.0}.",
        metrics.max_score, metrics.min_score
    );

    let mut table = Table::new();
    table.set_header(vec!["Question", "Kind", "Correct %", "Avg marks"]);
    for stats in &metrics.question_stats {
        table.add_row(vec![
            Cell::new(&stats.prompt_excerpt),
            Cell::new(stats.kind),
            Cell::new(format!("{:.1}%", stats.correct_rate * 100.0)),
            Cell::new(format!("{:.2}", stats.average_marks)),
        ]);
    }
    println!("{table}");

    if !insights.high_performers.is_empty() {
        println!(
            "  High performers: {}",
            join_names(&insights.high_performers, names)
        );
    }
    if !insights.at_risk_students.is_empty() {
        println!(
            "  At risk: {}",
            join_names(&insights.at_risk_students, names)
        );
    }
    for recommendation in &insights.recommendations {
        println!("  Recommendation: {recommendation}");
    }
}

fn join_names(ids: &[Uuid], names: &HashMap<Uuid, &str>) -> String {
    ids.iter()
        .map(|id| match names.get(id) {
            Some(name) => (*name).to_string(),
            None => id.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build every student's report, print the rollup table, save JSON files.
async fn save_reports(
    course: &CourseFile,
    store: &Arc<dyn GradebookStore>,
    output_dir: &Path,
) -> Result<()> {
    let builder = ReportBuilder::new(Arc::clone(store));

    let mut table = Table::new();
    table.set_header(vec!["Student", "Attempted", "Overall %", "GPA"]);

    for user in course.users.iter().filter(|u| u.role == Role::Student) {
        let report = builder.build(user.id).await?;
        table.add_row(vec![
            Cell::new(&report.student_name),
            Cell::new(report.assignments_attempted),
            Cell::new(format!("{:.2}", report.overall_percentage)),
            Cell::new(format!("{:.2}", report.gpa)),
        ]);

        let path = output_dir.join(format!("report-{}.json", user.id));
        report.save_json(&path)?;
    }

    println!("\nAcademic reports:");
    println!("{table}");
    eprintln!("Reports saved to: {}", output_dir.display());

    Ok(())
}
