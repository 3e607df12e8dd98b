//! Rule-based insight derivation.
//!
//! Turns aggregated metrics into qualitative labels: a difficulty rating,
//! the sets of high-performing and at-risk students, and generic teaching
//! recommendations. Purely deterministic, no external calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::metrics::AssignmentMetrics;

/// Difficulty rating for an assignment, judged from cohort performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// Thresholds used when deriving insights.
///
/// All four are fractions of the assignment's maximum marks. The difficulty
/// comparisons are strict, so a mean landing exactly on a threshold rates
/// the assignment `Medium`.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    /// Mean/max ratio above which an assignment rates `Easy`.
    pub easy_threshold: f64,
    /// Mean/max ratio below which an assignment rates `Hard`.
    pub hard_threshold: f64,
    /// Fraction of max marks a score must exceed to count as high-performing.
    pub high_performer_ratio: f64,
    /// Fraction of max marks below which a score flags the student at risk.
    pub at_risk_ratio: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            easy_threshold: 0.8,
            hard_threshold: 0.4,
            high_performer_ratio: 0.9,
            at_risk_ratio: 0.4,
        }
    }
}

/// Fixed recommendations attached to every report.
const TEACHING_RECOMMENDATIONS: [&str; 2] = [
    "Review the concepts covered in the questions with low correct rates.",
    "Provide more practice examples for free-text questions.",
];

/// Qualitative insights derived from one assignment's metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightReport {
    pub difficulty: Difficulty,
    /// One-line cohort summary.
    pub summary: String,
    /// Students whose score exceeds the high-performer cutoff, sorted by id.
    pub high_performers: Vec<Uuid>,
    /// Students whose score falls below the at-risk cutoff, sorted by id.
    pub at_risk_students: Vec<Uuid>,
    pub recommendations: Vec<String>,
}

/// Derives an [`InsightReport`] from aggregated metrics.
pub struct InsightGenerator {
    config: InsightConfig,
}

impl InsightGenerator {
    pub fn new(config: InsightConfig) -> Self {
        Self { config }
    }

    /// Derive insights for an assignment worth `max_marks`.
    ///
    /// Identical metrics always produce an identical report.
    pub fn derive(&self, metrics: &AssignmentMetrics, max_marks: u32) -> InsightReport {
        let max = f64::from(max_marks);
        let ratio = if max > 0.0 { metrics.mean_score / max } else { 0.0 };

        let difficulty = if ratio > self.config.easy_threshold {
            Difficulty::Easy
        } else if ratio < self.config.hard_threshold {
            Difficulty::Hard
        } else {
            Difficulty::Medium
        };

        let high_performers =
            self.students_where(metrics, |score| score > self.config.high_performer_ratio * max);
        let at_risk_students =
            self.students_where(metrics, |score| score < self.config.at_risk_ratio * max);

        let summary = format!(
            "{} submissions averaged {:.2} of {max_marks} marks; difficulty rated {difficulty}.",
            metrics.submission_count, metrics.mean_score
        );

        InsightReport {
            difficulty,
            summary,
            high_performers,
            at_risk_students,
            recommendations: TEACHING_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Collect the ids of students whose score satisfies `keep`, sorted and
    /// deduplicated so repeat attempts list a student once.
    fn students_where(
        &self,
        metrics: &AssignmentMetrics,
        keep: impl Fn(f64) -> bool,
    ) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = metrics
            .student_scores
            .iter()
            .filter(|s| keep(f64::from(s.score)))
            .map(|s| s.student_id)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
