//! Cross-assignment academic reports for individual students.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::metrics::round2;
use crate::model::Role;
use crate::traits::GradebookStore;

/// Rollup of one student's evaluated work across all assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicReport {
    pub student_id: Uuid,
    pub student_name: String,
    pub generated_at: DateTime<Utc>,
    /// Number of evaluated attempts included in the rollup.
    pub assignments_attempted: usize,
    /// Total marks earned over total marks possible, as a percentage.
    pub overall_percentage: f64,
    /// Overall percentage mapped onto a 0 to 10 scale.
    pub gpa: f64,
    /// Per-attempt breakdown in submission order.
    pub lines: Vec<ReportLine>,
}

/// One evaluated attempt in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLine {
    pub assignment_title: String,
    pub score: u32,
    pub max_marks: u32,
    pub percentage: f64,
    pub feedback: String,
}

impl AcademicReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AcademicReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

/// Builds academic reports from stored submissions.
pub struct ReportBuilder {
    store: Arc<dyn GradebookStore>,
}

impl ReportBuilder {
    pub fn new(store: Arc<dyn GradebookStore>) -> Self {
        Self { store }
    }

    /// Build the report for one student.
    ///
    /// Only submissions that carry an evaluation contribute; drafts and
    /// not-yet-graded work are skipped. A student with no evaluated work
    /// gets an empty report with zeroed percentage and GPA.
    pub async fn build(&self, student_id: Uuid) -> Result<AcademicReport, CoreError> {
        let user = self
            .store
            .user(student_id)
            .await?
            .ok_or(CoreError::UserNotFound(student_id))?;
        if user.role != Role::Student {
            return Err(CoreError::NotAStudent(student_id));
        }

        let submissions = self.store.submissions_for_student(student_id).await?;

        let mut lines = Vec::new();
        let mut earned: u32 = 0;
        let mut possible: u32 = 0;
        for submission in &submissions {
            let Some(evaluation) = &submission.evaluation else {
                continue;
            };
            let assignment = self
                .store
                .assignment(submission.assignment_id)
                .await?
                .ok_or(CoreError::AssignmentNotFound(submission.assignment_id))?;

            earned += evaluation.total_marks;
            possible += assignment.max_marks;
            lines.push(ReportLine {
                assignment_title: assignment.title,
                score: evaluation.total_marks,
                max_marks: assignment.max_marks,
                percentage: percentage(evaluation.total_marks, assignment.max_marks),
                feedback: evaluation.overall_feedback.clone(),
            });
        }

        let overall_percentage = percentage(earned, possible);
        Ok(AcademicReport {
            student_id,
            student_name: user.name,
            generated_at: Utc::now(),
            assignments_attempted: lines.len(),
            overall_percentage,
            gpa: round2(overall_percentage / 10.0),
            lines,
        })
    }
}

fn percentage(score: u32, max: u32) -> f64 {
    if max == 0 {
        0.0
    } else {
        round2(f64::from(score) / f64::from(max) * 100.0)
    }
}
