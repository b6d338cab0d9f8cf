//! Interaction pattern analysis: frequency trend, monthly consistency, type
//! preferences, follow-up response times, and seasonal/weekly distribution.
//!
//! Every function is pure over an interaction slice and an as-of instant.
//! Input order never matters; functions that need chronology sort a copy.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{Interaction, InteractionType};
use crate::util::{self, DAYS_PER_MONTH};

/// Trailing window for "current" frequency.
const CURRENT_WINDOW_MONTHS: u32 = 6;
/// Follow-ups answered within this many hours count as responded.
pub const RESPONSE_WINDOW_HOURS: f64 = 168.0;
/// History span needed before quarter distribution is meaningful.
const SEASONAL_MIN_DAYS: f64 = 180.0;
/// Interactions needed before weekday distribution is meaningful.
const WEEKLY_MIN_INTERACTIONS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyTrend {
    Increasing,
    Stable,
    Decreasing,
}

impl FrequencyTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyTrend::Increasing => "increasing",
            FrequencyTrend::Stable => "stable",
            FrequencyTrend::Decreasing => "decreasing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyPattern {
    /// Interactions per month over the trailing window.
    pub current_frequency: f64,
    /// Interactions per month since the first interaction.
    pub historical_average: f64,
    pub trend: FrequencyTrend,
    pub interactions_last_30_days: usize,
    pub interactions_last_90_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypePreference {
    pub interaction_type: InteractionType,
    pub count: usize,
    pub share_percent: f64,
    pub average_duration_minutes: Option<f64>,
    pub last_used: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimePattern {
    pub follow_ups_required: usize,
    pub responded_within_week: usize,
    pub average_response_hours: Option<f64>,
    pub median_response_hours: Option<f64>,
    /// Percent of required follow-ups answered within a week.
    pub response_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionPattern {
    pub sufficient_data: bool,
    pub buckets: Vec<PeriodCount>,
    pub peak: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternAnalytics {
    pub frequency: FrequencyPattern,
    pub consistency_coefficient: f64,
    pub type_preferences: Vec<TypePreference>,
    pub response_times: ResponseTimePattern,
    pub seasonal: DistributionPattern,
    pub weekly: DistributionPattern,
}

/// Run every pattern analysis over `interactions`.
pub fn analyze_patterns(interactions: &[Interaction], as_of: DateTime<Utc>) -> PatternAnalytics {
    PatternAnalytics {
        frequency: frequency_pattern(interactions, as_of),
        consistency_coefficient: consistency_coefficient(interactions),
        type_preferences: type_preferences(interactions),
        response_times: response_time_pattern(interactions),
        seasonal: seasonal_pattern(interactions),
        weekly: weekly_pattern(interactions),
    }
}

fn first_date(interactions: &[Interaction]) -> Option<DateTime<Utc>> {
    interactions.iter().map(|i| i.interaction_date).min()
}

fn last_date(interactions: &[Interaction]) -> Option<DateTime<Utc>> {
    interactions.iter().map(|i| i.interaction_date).max()
}

/// Interactions dated inside `(since, as_of]`.
pub fn count_between(
    interactions: &[Interaction],
    since: DateTime<Utc>,
    as_of: DateTime<Utc>,
) -> usize {
    interactions
        .iter()
        .filter(|i| i.interaction_date > since && i.interaction_date <= as_of)
        .count()
}

/// Current vs historical interactions-per-month and the resulting trend.
pub fn frequency_pattern(interactions: &[Interaction], as_of: DateTime<Utc>) -> FrequencyPattern {
    let Some(first) = first_date(interactions) else {
        return FrequencyPattern {
            current_frequency: 0.0,
            historical_average: 0.0,
            trend: FrequencyTrend::Stable,
            interactions_last_30_days: 0,
            interactions_last_90_days: 0,
        };
    };

    let elapsed_months = (util::days_between(first, as_of) / DAYS_PER_MONTH).max(1.0);
    let window_start = util::months_before(as_of, CURRENT_WINDOW_MONTHS);

    let current =
        count_between(interactions, window_start, as_of) as f64 / CURRENT_WINDOW_MONTHS as f64;
    let historical = interactions.len() as f64 / elapsed_months;

    let trend = if current > historical * 1.1 {
        FrequencyTrend::Increasing
    } else if current < historical * 0.9 {
        FrequencyTrend::Decreasing
    } else {
        FrequencyTrend::Stable
    };

    FrequencyPattern {
        current_frequency: util::round2(current),
        historical_average: util::round2(historical),
        trend,
        interactions_last_30_days: count_between(interactions, as_of - Duration::days(30), as_of),
        interactions_last_90_days: count_between(interactions, as_of - Duration::days(90), as_of),
    }
}

/// Interaction counts per calendar month from the first to the last
/// interaction month, empty months included.
pub fn monthly_counts(interactions: &[Interaction]) -> Vec<usize> {
    let (Some(first), Some(last)) = (first_date(interactions), last_date(interactions)) else {
        return Vec::new();
    };
    let mut by_month: HashMap<(i32, u32), usize> = HashMap::new();
    for interaction in interactions {
        let d = interaction.interaction_date;
        *by_month.entry((d.year(), d.month())).or_default() += 1;
    }
    util::month_span(first, last)
        .into_iter()
        .map(|key| by_month.get(&key).copied().unwrap_or(0))
        .collect()
}

/// `1 − CV` of monthly counts, clamped to [0, 1].
///
/// Empty input is 0. A history inside a single month is fully consistent.
pub fn consistency_coefficient(interactions: &[Interaction]) -> f64 {
    let counts = monthly_counts(interactions);
    match counts.len() {
        0 => 0.0,
        1 => 1.0,
        n => {
            let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
            let mean = values.iter().sum::<f64>() / n as f64;
            if mean == 0.0 {
                return 0.0;
            }
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            let cv = variance.sqrt() / mean;
            (1.0 - cv).clamp(0.0, 1.0)
        }
    }
}

/// Per-type usage, most used first.
pub fn type_preferences(interactions: &[Interaction]) -> Vec<TypePreference> {
    struct Acc {
        count: usize,
        durations: Vec<f64>,
        last_used: DateTime<Utc>,
    }

    let mut by_type: BTreeMap<InteractionType, Acc> = BTreeMap::new();
    for interaction in interactions {
        let acc = by_type.entry(interaction.interaction_type).or_insert(Acc {
            count: 0,
            durations: Vec::new(),
            last_used: interaction.interaction_date,
        });
        acc.count += 1;
        if let Some(minutes) = interaction.duration_minutes {
            acc.durations.push(minutes as f64);
        }
        acc.last_used = acc.last_used.max(interaction.interaction_date);
    }

    let total = interactions.len().max(1) as f64;
    let mut preferences: Vec<TypePreference> = by_type
        .into_iter()
        .map(|(interaction_type, acc)| TypePreference {
            interaction_type,
            count: acc.count,
            share_percent: util::round2(100.0 * acc.count as f64 / total),
            average_duration_minutes: util::mean(&acc.durations).map(util::round2),
            last_used: acc.last_used,
        })
        .collect();
    preferences.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.interaction_type.as_str().cmp(b.interaction_type.as_str()))
    });
    preferences
}

/// Hours from each follow-up-required interaction to the next interaction.
///
/// Follow-ups with no later interaction are unanswered and yield no entry.
pub fn response_hours(interactions: &[Interaction]) -> (usize, Vec<f64>) {
    let mut ordered: Vec<&Interaction> = interactions.iter().collect();
    ordered.sort_by(|a, b| {
        a.interaction_date
            .cmp(&b.interaction_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut required = 0;
    let mut hours = Vec::new();
    for (idx, interaction) in ordered.iter().enumerate() {
        if !interaction.follow_up_required {
            continue;
        }
        required += 1;
        if let Some(next) = ordered.get(idx + 1) {
            hours.push(util::hours_between(interaction.interaction_date, next.interaction_date));
        }
    }
    (required, hours)
}

pub fn response_time_pattern(interactions: &[Interaction]) -> ResponseTimePattern {
    let (required, hours) = response_hours(interactions);
    let within_week = hours.iter().filter(|&&h| h <= RESPONSE_WINDOW_HOURS).count();
    ResponseTimePattern {
        follow_ups_required: required,
        responded_within_week: within_week,
        average_response_hours: util::mean(&hours).map(util::round2),
        median_response_hours: util::median(&hours).map(util::round2),
        response_rate: (required > 0)
            .then(|| util::round2(100.0 * within_week as f64 / required as f64)),
    }
}

fn distribution(labels: &[&str], counts: Vec<usize>, sufficient: bool) -> DistributionPattern {
    if !sufficient {
        return DistributionPattern {
            sufficient_data: false,
            buckets: labels
                .iter()
                .map(|l| PeriodCount {
                    label: l.to_string(),
                    count: 0,
                })
                .collect(),
            peak: None,
        };
    }

    let mut peak: Option<(usize, usize)> = None;
    for (idx, &count) in counts.iter().enumerate() {
        if count > 0 && peak.map_or(true, |(_, best)| count > best) {
            peak = Some((idx, count));
        }
    }

    DistributionPattern {
        sufficient_data: true,
        buckets: labels
            .iter()
            .zip(counts)
            .map(|(l, count)| PeriodCount {
                label: l.to_string(),
                count,
            })
            .collect(),
        peak: peak.map(|(idx, _)| labels[idx].to_string()),
    }
}

/// Interactions per calendar quarter.
pub fn seasonal_pattern(interactions: &[Interaction]) -> DistributionPattern {
    let sufficient = match (first_date(interactions), last_date(interactions)) {
        (Some(first), Some(last)) => util::days_between(first, last) >= SEASONAL_MIN_DAYS,
        _ => false,
    };
    let mut counts = vec![0usize; 4];
    for interaction in interactions {
        counts[(interaction.interaction_date.month0() / 3) as usize] += 1;
    }
    distribution(&["Q1", "Q2", "Q3", "Q4"], counts, sufficient)
}

/// Interactions per weekday, Monday first.
pub fn weekly_pattern(interactions: &[Interaction]) -> DistributionPattern {
    let mut counts = vec![0usize; 7];
    for interaction in interactions {
        counts[interaction.interaction_date.weekday().num_days_from_monday() as usize] += 1;
    }
    distribution(
        &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        counts,
        interactions.len() >= WEEKLY_MIN_INTERACTIONS,
    )
}
