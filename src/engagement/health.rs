//! Relationship health scoring.
//!
//! Four weighted components, each 0–100:
//! - Communication (0.30): recent activity, channel diversity, outcome logging
//! - Response (0.25): follow-up response time and rate
//! - Engagement depth (0.25): meeting length, follow-up completion, outcome quality
//! - Consistency (0.20): evenness of monthly volume
//!
//! Component and overall trends compare against the same scoring run on the
//! history as it stood 90 days earlier.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::patterns;
use super::sentiment;
use crate::db::Interaction;
use crate::util::{self, DAYS_PER_MONTH};

const COMMUNICATION_WEIGHT: f64 = 0.30;
const RESPONSE_WEIGHT: f64 = 0.25;
const DEPTH_WEIGHT: f64 = 0.25;
const CONSISTENCY_WEIGHT: f64 = 0.20;

/// Hours after which a response earns no response-time credit.
const RESPONSE_CEILING_HOURS: f64 = 120.0;
/// Score delta that counts as a real change rather than noise.
const TREND_THRESHOLD: f64 = 5.0;
const TREND_LOOKBACK_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentName {
    Communication,
    Response,
    Depth,
    Consistency,
}

impl ComponentName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentName::Communication => "communication",
            ComponentName::Response => "response",
            ComponentName::Depth => "depth",
            ComponentName::Consistency => "consistency",
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            ComponentName::Communication => COMMUNICATION_WEIGHT,
            ComponentName::Response => RESPONSE_WEIGHT,
            ComponentName::Depth => DEPTH_WEIGHT,
            ComponentName::Consistency => CONSISTENCY_WEIGHT,
        }
    }
}

const COMPONENTS: [ComponentName; 4] = [
    ComponentName::Communication,
    ComponentName::Response,
    ComponentName::Depth,
    ComponentName::Consistency,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Low,
    Medium,
    High,
}

impl TrustLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::Low => "low",
            TrustLevel::Medium => "medium",
            TrustLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnershipDepth {
    Transactional,
    Collaborative,
    Strategic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipMaturity {
    New,
    Developing,
    Established,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthComponent {
    pub name: ComponentName,
    pub score: f64,
    pub weight: f64,
    pub trend: HealthTrend,
    pub indicators: Vec<String>,
    pub improvement_potential: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub components: Vec<HealthComponent>,
    pub overall_score: f64,
    pub health_trend: HealthTrend,
    pub trust_level: TrustLevel,
    pub partnership_depth: PartnershipDepth,
    pub relationship_maturity: RelationshipMaturity,
}

impl HealthMetrics {
    pub fn component(&self, name: ComponentName) -> Option<&HealthComponent> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Score the relationship as of `as_of`.
///
/// `interactions` must not contain anything dated after `as_of`.
pub fn score_health(
    interactions: &[Interaction],
    active_distributors: usize,
    as_of: DateTime<Utc>,
) -> HealthMetrics {
    let earlier_as_of = as_of - Duration::days(TREND_LOOKBACK_DAYS);
    let earlier: Vec<Interaction> = interactions
        .iter()
        .filter(|i| i.interaction_date <= earlier_as_of)
        .cloned()
        .collect();

    let mut components = Vec::with_capacity(COMPONENTS.len());
    for name in COMPONENTS {
        let (score, indicators) = score_component(name, interactions, as_of);
        let trend = if earlier.is_empty() {
            HealthTrend::Stable
        } else {
            classify_trend(score, score_component(name, &earlier, earlier_as_of).0)
        };
        components.push(HealthComponent {
            name,
            score,
            weight: name.weight(),
            trend,
            indicators,
            improvement_potential: util::round2(100.0 - score),
        });
    }

    let overall_score = weighted_overall(&components);
    let health_trend = if earlier.is_empty() {
        HealthTrend::Stable
    } else {
        let earlier_components: Vec<HealthComponent> = COMPONENTS
            .iter()
            .map(|&name| HealthComponent {
                name,
                score: score_component(name, &earlier, earlier_as_of).0,
                weight: name.weight(),
                trend: HealthTrend::Stable,
                indicators: Vec::new(),
                improvement_potential: 0.0,
            })
            .collect();
        classify_trend(overall_score, weighted_overall(&earlier_components))
    };

    let depth_score = components
        .iter()
        .find(|c| c.name == ComponentName::Depth)
        .map_or(0.0, |c| c.score);

    HealthMetrics {
        trust_level: trust_level(overall_score),
        partnership_depth: partnership_depth(depth_score, active_distributors),
        relationship_maturity: relationship_maturity(interactions, as_of),
        components,
        overall_score,
        health_trend,
    }
}

fn score_component(
    name: ComponentName,
    interactions: &[Interaction],
    as_of: DateTime<Utc>,
) -> (f64, Vec<String>) {
    let (score, indicators) = match name {
        ComponentName::Communication => communication_score(interactions, as_of),
        ComponentName::Response => response_score(interactions),
        ComponentName::Depth => depth_score(interactions),
        ComponentName::Consistency => consistency_score(interactions),
    };
    (util::round2(util::clamp_score(score)), indicators)
}

/// `round(Σ score·weight / Σ weight)`.
pub fn weighted_overall(components: &[HealthComponent]) -> f64 {
    let total_weight: f64 = components.iter().map(|c| c.weight).sum();
    if total_weight == 0.0 {
        return 0.0;
    }
    let weighted: f64 = components.iter().map(|c| c.score * c.weight).sum();
    util::clamp_score((weighted / total_weight).round())
}

fn classify_trend(current: f64, earlier: f64) -> HealthTrend {
    let delta = current - earlier;
    if delta > TREND_THRESHOLD {
        HealthTrend::Improving
    } else if delta < -TREND_THRESHOLD {
        HealthTrend::Declining
    } else {
        HealthTrend::Stable
    }
}

pub fn communication_score(interactions: &[Interaction], as_of: DateTime<Utc>) -> (f64, Vec<String>) {
    if interactions.is_empty() {
        return (0.0, vec!["No interactions recorded".to_string()]);
    }

    let recent = patterns::count_between(interactions, as_of - Duration::days(30), as_of);
    let distinct_types: HashSet<_> = interactions.iter().map(|i| i.interaction_type).collect();
    let with_outcome = interactions.iter().filter(|i| i.outcome_text().is_some()).count();

    let recent_activity = (recent as f64 * 10.0).min(100.0);
    let diversity = (distinct_types.len() as f64 * 12.5).min(100.0);
    let outcome_presence = 100.0 * with_outcome as f64 / interactions.len() as f64;

    let indicators = vec![
        format!("{} interactions in the last 30 days", recent),
        format!("{} interaction types used", distinct_types.len()),
        format!("{:.0}% of interactions have a recorded outcome", outcome_presence),
    ];
    ((recent_activity + diversity + outcome_presence) / 3.0, indicators)
}

pub fn response_score(interactions: &[Interaction]) -> (f64, Vec<String>) {
    if interactions.is_empty() {
        return (0.0, vec!["No interactions recorded".to_string()]);
    }

    let pattern = patterns::response_time_pattern(interactions);
    if pattern.follow_ups_required == 0 {
        return (100.0, vec!["No follow-ups were required".to_string()]);
    }

    let time_score = pattern.average_response_hours.map_or(0.0, |hours| {
        100.0 * (1.0 - hours.min(RESPONSE_CEILING_HOURS) / RESPONSE_CEILING_HOURS)
    });
    let rate = pattern.response_rate.unwrap_or(0.0);

    let mut indicators = vec![format!(
        "{} of {} follow-ups answered within a week",
        pattern.responded_within_week, pattern.follow_ups_required
    )];
    if let Some(hours) = pattern.average_response_hours {
        indicators.push(format!("Average response time {:.1} hours", hours));
    }
    ((time_score + rate) / 2.0, indicators)
}

/// Follow-ups completed no later than the end of their due day.
pub fn follow_up_completion_rate(interactions: &[Interaction]) -> Option<f64> {
    let required: Vec<&Interaction> = interactions.iter().filter(|i| i.follow_up_required).collect();
    if required.is_empty() {
        return None;
    }
    let on_time = required
        .iter()
        .filter(|i| match (i.follow_up_completed_at, i.follow_up_date) {
            (Some(done), Some(due)) => done.date_naive() <= due,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .count();
    Some(100.0 * on_time as f64 / required.len() as f64)
}

pub fn depth_score(interactions: &[Interaction]) -> (f64, Vec<String>) {
    if interactions.is_empty() {
        return (0.0, vec!["No interactions recorded".to_string()]);
    }

    let durations: Vec<f64> = interactions
        .iter()
        .filter_map(|i| i.duration_minutes)
        .map(|m| m as f64)
        .collect();
    let duration_score = util::mean(&durations).map_or(0.0, |avg| (avg / 60.0 * 100.0).min(100.0));
    let completion = follow_up_completion_rate(interactions).unwrap_or(100.0);
    let quality = sentiment::positivity_ratio(interactions.iter().filter_map(|i| i.outcome_text()))
        .unwrap_or(0.0);

    let mut indicators = Vec::new();
    match util::mean(&durations) {
        Some(avg) => indicators.push(format!("Average duration {:.0} minutes", avg)),
        None => indicators.push("No durations recorded".to_string()),
    }
    indicators.push(format!("{:.0}% of follow-ups completed on time", completion));
    indicators.push(format!("{:.0}% of outcomes positive", quality));

    ((duration_score + completion + quality) / 3.0, indicators)
}

pub fn consistency_score(interactions: &[Interaction]) -> (f64, Vec<String>) {
    let coefficient = patterns::consistency_coefficient(interactions);
    let months = patterns::monthly_counts(interactions).len();
    (
        coefficient * 100.0,
        vec![format!(
            "Consistency coefficient {:.2} over {} months",
            coefficient, months
        )],
    )
}

pub fn trust_level(overall: f64) -> TrustLevel {
    if overall >= 75.0 {
        TrustLevel::High
    } else if overall >= 50.0 {
        TrustLevel::Medium
    } else {
        TrustLevel::Low
    }
}

pub fn partnership_depth(depth: f64, active_distributors: usize) -> PartnershipDepth {
    if depth >= 70.0 && active_distributors >= 3 {
        PartnershipDepth::Strategic
    } else if depth >= 40.0 {
        PartnershipDepth::Collaborative
    } else {
        PartnershipDepth::Transactional
    }
}

pub fn relationship_maturity(interactions: &[Interaction], as_of: DateTime<Utc>) -> RelationshipMaturity {
    let Some(first) = interactions.iter().map(|i| i.interaction_date).min() else {
        return RelationshipMaturity::New;
    };
    let months = util::days_between(first, as_of) / DAYS_PER_MONTH;
    if months < 6.0 {
        RelationshipMaturity::New
    } else if months < 24.0 {
        RelationshipMaturity::Developing
    } else {
        RelationshipMaturity::Established
    }
}
