//! Materialized per-assignment analytics.
//!
//! Splits the read path in two: `regenerate` recomputes metrics and insights
//! from current submissions and upserts the record, while `cached` returns
//! whatever was stored last without touching submission data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::CoreError;
use crate::insights::{InsightConfig, InsightGenerator, InsightReport};
use crate::metrics::{AssignmentMetrics, MetricsAggregator};
use crate::traits::GradebookStore;

/// The stored analytics record for one assignment.
///
/// `metrics` and `insights` are pure functions of the submission data, so
/// regenerating over unchanged submissions reproduces them exactly.
/// `generated_at` records the recompute time and is the only field allowed
/// to differ between such runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentAnalytics {
    pub assignment_id: Uuid,
    pub metrics: AssignmentMetrics,
    pub insights: InsightReport,
    pub generated_at: DateTime<Utc>,
}

/// Computes and stores assignment analytics.
pub struct AnalyticsEngine {
    store: Arc<dyn GradebookStore>,
    aggregator: MetricsAggregator,
    generator: InsightGenerator,
}

impl AnalyticsEngine {
    pub fn new(store: Arc<dyn GradebookStore>, config: InsightConfig) -> Self {
        Self {
            aggregator: MetricsAggregator::new(Arc::clone(&store)),
            generator: InsightGenerator::new(config),
            store,
        }
    }

    /// Recompute analytics for an assignment and upsert the result.
    ///
    /// Returns `Ok(None)` without writing anything when the assignment has no
    /// submitted work to analyze, leaving any previously stored record alone.
    pub async fn regenerate(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<AssignmentAnalytics>, CoreError> {
        let assignment = self
            .store
            .assignment(assignment_id)
            .await?
            .ok_or(CoreError::AssignmentNotFound(assignment_id))?;

        let Some(metrics) = self.aggregator.aggregate(assignment_id).await? else {
            return Ok(None);
        };

        let insights = self.generator.derive(&metrics, assignment.max_marks);
        let analytics = AssignmentAnalytics {
            assignment_id,
            metrics,
            insights,
            generated_at: Utc::now(),
        };
        self.store.upsert_analytics(analytics.clone()).await?;
        info!(%assignment_id, submissions = analytics.metrics.submission_count, "analytics regenerated");

        Ok(Some(analytics))
    }

    /// Return the stored analytics record, if any, without recomputing.
    pub async fn cached(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<AssignmentAnalytics>, CoreError> {
        Ok(self.store.analytics(assignment_id).await?)
    }
}
