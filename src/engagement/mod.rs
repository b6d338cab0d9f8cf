//! Principal engagement analytics.
//!
//! `EngagementService` loads a principal's relationships and interactions
//! through the `RecordStore` seam and runs the analyzers over them:
//! patterns, health, risk and growth signals, trends and the weekly
//! timeline. Every relative window is measured from a single as-of instant,
//! so two runs with the same instant over the same data are identical.

pub mod health;
pub mod patterns;
pub mod recommendations;
pub mod repository;
pub mod risk;
pub mod sentiment;
pub mod timeline;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::EngagementConfig;
use crate::db::{DbError, Interaction, PrincipalFilter};
use crate::error::EngagementError;
use crate::store::{RecordStore, SqliteRecordStore};

use health::HealthMetrics;
use patterns::PatternAnalytics;
use recommendations::Recommendation;
use repository::{PrincipalContext, RelationshipRepository};
use risk::{ChurnIndicator, GrowthIndicator, RiskFactor};
use timeline::{CommunicationTrends, DistributorSummary, TimelineEntry};

/// Which analytics sections to compute, and the instant to compute them at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationOptions {
    #[serde(default = "default_true")]
    pub include_patterns: bool,
    #[serde(default = "default_true")]
    pub include_health_metrics: bool,
    #[serde(default = "default_true")]
    pub include_trends: bool,
    #[serde(default = "default_true")]
    pub include_risk_factors: bool,
    /// Defaults to the moment the aggregation starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            include_patterns: true,
            include_health_metrics: true,
            include_trends: true,
            include_risk_factors: true,
            as_of: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalEngagementAnalytics {
    pub principal_id: String,
    pub principal_name: String,
    /// The as-of instant every window was measured from.
    pub generated_at: DateTime<Utc>,
    pub total_interactions: usize,
    pub distributor_count: usize,
    pub distributor_summaries: Vec<DistributorSummary>,
    pub patterns: Option<PatternAnalytics>,
    pub health: Option<HealthMetrics>,
    pub trends: Option<CommunicationTrends>,
    pub risk_factors: Option<Vec<RiskFactor>>,
    pub churn_indicators: Vec<ChurnIndicator>,
    pub growth_indicators: Vec<GrowthIndicator>,
    pub risk_score: f64,
    pub timeline: Vec<TimelineEntry>,
    pub first_interaction_date: Option<DateTime<Utc>>,
    pub last_interaction_date: Option<DateTime<Utc>>,
}

/// One principal that could not be aggregated in a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalFailure {
    pub principal_id: String,
    pub kind: String,
    pub message: String,
}

/// Batch results in principal listing order, failures kept separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAggregation {
    pub analytics: Vec<PrincipalEngagementAnalytics>,
    pub failures: Vec<PrincipalFailure>,
}

impl BatchAggregation {
    /// All-or-nothing view: any failure becomes `PartialBatchFailure`.
    pub fn into_strict(self) -> Result<Vec<PrincipalEngagementAnalytics>, EngagementError> {
        if self.failures.is_empty() {
            Ok(self.analytics)
        } else {
            Err(EngagementError::PartialBatchFailure {
                failed: self.failures.len(),
                succeeded: self.analytics.len(),
            })
        }
    }
}

#[derive(Clone)]
pub struct EngagementService {
    repository: RelationshipRepository,
    config: EngagementConfig,
}

impl EngagementService {
    pub fn new(store: Arc<dyn RecordStore>, config: EngagementConfig) -> Self {
        Self {
            repository: RelationshipRepository::new(store),
            config,
        }
    }

    /// Open the SQLite store named by the config (or the default path).
    pub fn from_config(config: EngagementConfig) -> Result<Self, EngagementError> {
        config.validate().map_err(EngagementError::Validation)?;
        let store = match &config.database_path {
            Some(path) => SqliteRecordStore::open_at(path)?,
            None => SqliteRecordStore::new(crate::db::EngagementDb::open()?),
        };
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    fn resolve_options(&self, options: Option<AggregationOptions>) -> AggregationOptions {
        let mut options = options.unwrap_or_else(|| self.config.default_options.clone());
        options.as_of.get_or_insert_with(Utc::now);
        options
    }

    /// Full analytics for one principal.
    ///
    /// `None` options fall back to the configured defaults.
    pub async fn aggregate_engagement_by_principal(
        &self,
        principal_id: &str,
        options: Option<AggregationOptions>,
    ) -> Result<PrincipalEngagementAnalytics, EngagementError> {
        if principal_id.trim().is_empty() {
            return Err(EngagementError::Validation(
                "principal id must not be empty".to_string(),
            ));
        }
        let options = self.resolve_options(options);
        let as_of = options.as_of.unwrap_or_else(Utc::now);

        let ctx = self.repository.load_principal_context(principal_id).await?;
        let analytics = self.build_analytics(ctx, &options, as_of);
        log::debug!(
            "Aggregated principal {}: {} interactions, {} distributors, risk {}",
            analytics.principal_id,
            analytics.total_interactions,
            analytics.distributor_count,
            analytics.risk_score
        );
        Ok(analytics)
    }

    /// Analytics for every principal matching `filter`.
    ///
    /// Runs up to `batch_concurrency` principals at once. One principal
    /// failing never fails the batch; it is logged and reported in
    /// `BatchAggregation::failures`.
    pub async fn aggregate_all_principals(
        &self,
        filter: &PrincipalFilter,
        options: Option<AggregationOptions>,
    ) -> Result<BatchAggregation, EngagementError> {
        validate_filter(filter)?;
        // One instant for the whole batch
        let options = self.resolve_options(options);
        let principals = self.repository.list_principals(filter).await?;
        log::info!(
            "Aggregating {} principals (concurrency {})",
            principals.len(),
            self.config.batch_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.config.batch_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (idx, principal) in principals.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let service = self.clone();
            let options = options.clone();
            let principal_id = principal.id.clone();
            tasks.spawn(async move {
                let result: Result<PrincipalEngagementAnalytics, EngagementError> = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| DbError::Task(e.to_string()))?;
                    service
                        .aggregate_engagement_by_principal(&principal_id, Some(options))
                        .await
                }
                .await;
                (idx, result)
            });
        }

        let mut slots: Vec<Option<Result<PrincipalEngagementAnalytics, EngagementError>>> =
            principals.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => log::error!("Aggregation task panicked: {}", e),
            }
        }

        let mut batch = BatchAggregation::default();
        for (principal, slot) in principals.iter().zip(slots) {
            let failure = match slot {
                Some(Ok(analytics)) => {
                    batch.analytics.push(analytics);
                    continue;
                }
                Some(Err(e)) => PrincipalFailure {
                    principal_id: principal.id.clone(),
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                },
                None => PrincipalFailure {
                    principal_id: principal.id.clone(),
                    kind: "task_failed".to_string(),
                    message: "aggregation task did not complete".to_string(),
                },
            };
            log::warn!(
                "Principal {} failed to aggregate ({}): {}",
                failure.principal_id,
                failure.kind,
                failure.message
            );
            batch.failures.push(failure);
        }

        log::info!(
            "Batch aggregation done: {} succeeded, {} failed",
            batch.analytics.len(),
            batch.failures.len()
        );
        Ok(batch)
    }

    pub fn generate_recommendations(
        &self,
        analytics: &PrincipalEngagementAnalytics,
    ) -> Vec<Recommendation> {
        recommendations::generate_recommendations(analytics)
    }

    fn build_analytics(
        &self,
        ctx: PrincipalContext,
        options: &AggregationOptions,
        as_of: DateTime<Utc>,
    ) -> PrincipalEngagementAnalytics {
        let PrincipalContext {
            principal,
            relationships,
            contacts,
            interactions,
        } = ctx;
        let interactions: Vec<Interaction> = interactions
            .into_iter()
            .filter(|i| i.interaction_date <= as_of)
            .collect();

        let pattern_analytics = patterns::analyze_patterns(&interactions, as_of);
        let summaries = timeline::distributor_summaries(&relationships, &interactions, as_of);
        // Growth detection reads health, so risk analysis needs it even when
        // the caller did not ask for the health section.
        let health_metrics = (options.include_health_metrics || options.include_risk_factors)
            .then(|| health::score_health(&interactions, relationships.len(), as_of));

        let (risk_factors, churn_indicators, growth_indicators, risk_score) =
            if options.include_risk_factors {
                let factors = risk::detect_risk_factors(&risk::RiskInputs {
                    interactions: &interactions,
                    relationships: &relationships,
                    contacts: &contacts,
                    frequency: &pattern_analytics.frequency,
                    as_of,
                });
                let growth = match &health_metrics {
                    Some(health) => risk::growth_indicators(&risk::GrowthInputs {
                        interactions: &interactions,
                        frequency: &pattern_analytics.frequency,
                        health,
                        distributors: &summaries,
                        as_of,
                    }),
                    None => Vec::new(),
                };
                let score = risk::risk_score(&factors);
                (
                    Some(factors),
                    risk::churn_indicators(&interactions, as_of),
                    growth,
                    score,
                )
            } else {
                (None, Vec::new(), Vec::new(), 0.0)
            };

        let trends = options.include_trends.then(|| {
            timeline::communication_trends(
                &interactions,
                as_of,
                self.config.trend_months,
                pattern_analytics.frequency.trend,
            )
        });

        PrincipalEngagementAnalytics {
            principal_id: principal.id,
            principal_name: principal.name,
            generated_at: as_of,
            total_interactions: interactions.len(),
            distributor_count: relationships.len(),
            distributor_summaries: summaries,
            timeline: timeline::engagement_timeline(&interactions, as_of, self.config.timeline_weeks),
            first_interaction_date: interactions.iter().map(|i| i.interaction_date).min(),
            last_interaction_date: interactions.iter().map(|i| i.interaction_date).max(),
            patterns: options.include_patterns.then_some(pattern_analytics),
            health: health_metrics.filter(|_| options.include_health_metrics),
            trends,
            risk_factors,
            churn_indicators,
            growth_indicators,
            risk_score,
        }
    }
}

fn validate_filter(filter: &PrincipalFilter) -> Result<(), EngagementError> {
    if matches!(&filter.ids, Some(ids) if ids.is_empty()) {
        return Err(EngagementError::Validation(
            "ids filter must not be empty".to_string(),
        ));
    }
    if matches!(&filter.name_contains, Some(name) if name.trim().is_empty()) {
        return Err(EngagementError::Validation(
            "nameContains filter must not be blank".to_string(),
        ));
    }
    if filter.limit == Some(0) {
        return Err(EngagementError::Validation(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// Shared test utilities
// =============================================================================
