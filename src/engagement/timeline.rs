//! Per-distributor summaries, monthly communication trends and the weekly
//! engagement timeline.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::patterns::FrequencyTrend;
use super::sentiment;
use crate::db::{DistributorRelationship, Interaction};
use crate::util;

const RECENT_WINDOW_DAYS: i64 = 90;
const HIGHLIGHTS_PER_WEEK: usize = 3;
/// Months on each side of the period-over-period comparison.
const PERIOD_MONTHS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributorSummary {
    pub distributor_id: String,
    pub distributor_name: String,
    pub territory: Option<String>,
    pub contract_end: Option<NaiveDate>,
    pub annual_volume_commitment: Option<f64>,
    pub interaction_count: usize,
    pub recent_interactions: usize,
    pub last_interaction_date: Option<DateTime<Utc>>,
    pub engagement_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub interaction_count: usize,
    pub average_duration_minutes: Option<f64>,
    /// Percent of recorded outcomes that read positive.
    pub positive_outcome_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationTrends {
    pub monthly: Vec<MonthlyTrend>,
    pub direction: FrequencyTrend,
    pub period_change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// ISO week, e.g. `2025-W24`.
    pub week: String,
    pub interaction_count: usize,
    pub by_type: BTreeMap<String, usize>,
    pub highlights: Vec<String>,
}

/// One summary per active relationship, most engaged first.
pub fn distributor_summaries(
    relationships: &[DistributorRelationship],
    interactions: &[Interaction],
    as_of: DateTime<Utc>,
) -> Vec<DistributorSummary> {
    let recent_since = as_of - Duration::days(RECENT_WINDOW_DAYS);

    let mut summaries: Vec<DistributorSummary> = relationships
        .iter()
        .map(|rel| {
            let attributed: Vec<&Interaction> = interactions
                .iter()
                .filter(|i| i.distributor_ids.iter().any(|d| d == &rel.distributor_id))
                .collect();
            let recent = attributed
                .iter()
                .filter(|i| i.interaction_date > recent_since)
                .count();
            DistributorSummary {
                distributor_id: rel.distributor_id.clone(),
                distributor_name: rel.distributor_name.clone(),
                territory: rel.territory.clone(),
                contract_end: rel.contract_end,
                annual_volume_commitment: rel.annual_volume_commitment,
                interaction_count: attributed.len(),
                recent_interactions: recent,
                last_interaction_date: attributed.iter().map(|i| i.interaction_date).max(),
                engagement_score: (recent as f64 * 10.0).min(100.0),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.engagement_score
            .total_cmp(&a.engagement_score)
            .then_with(|| a.distributor_name.cmp(&b.distributor_name))
            .then_with(|| a.distributor_id.cmp(&b.distributor_id))
    });
    summaries
}

/// The trailing `months` calendar months ending with the as-of month.
pub fn communication_trends(
    interactions: &[Interaction],
    as_of: DateTime<Utc>,
    months: u32,
    direction: FrequencyTrend,
) -> CommunicationTrends {
    let start = util::months_before(as_of, months.saturating_sub(1));
    let keys: Vec<String> = util::month_span(start, as_of)
        .into_iter()
        .map(|(y, m)| format!("{:04}-{:02}", y, m))
        .collect();

    let mut by_month: HashMap<String, Vec<&Interaction>> = HashMap::new();
    for interaction in interactions {
        by_month
            .entry(util::month_key(interaction.interaction_date))
            .or_default()
            .push(interaction);
    }

    let monthly: Vec<MonthlyTrend> = keys
        .into_iter()
        .map(|month| {
            let bucket = by_month.get(&month).map(Vec::as_slice).unwrap_or(&[]);
            let durations: Vec<f64> = bucket
                .iter()
                .filter_map(|i| i.duration_minutes)
                .map(|m| m as f64)
                .collect();
            MonthlyTrend {
                interaction_count: bucket.len(),
                average_duration_minutes: util::mean(&durations).map(util::round2),
                positive_outcome_ratio: sentiment::positivity_ratio(
                    bucket.iter().filter_map(|i| i.outcome_text()),
                )
                .map(util::round2),
                month,
            }
        })
        .collect();

    let period_change_percent = period_change(&monthly);
    CommunicationTrends {
        monthly,
        direction,
        period_change_percent,
    }
}

/// Last three months against the three before, as a percent change.
fn period_change(monthly: &[MonthlyTrend]) -> Option<f64> {
    if monthly.len() < PERIOD_MONTHS * 2 {
        return None;
    }
    let tail = &monthly[monthly.len() - PERIOD_MONTHS * 2..];
    let (prior, recent) = tail.split_at(PERIOD_MONTHS);
    let prior: usize = prior.iter().map(|m| m.interaction_count).sum();
    let recent: usize = recent.iter().map(|m| m.interaction_count).sum();
    if prior == 0 {
        return None;
    }
    Some(util::round2(
        100.0 * (recent as f64 - prior as f64) / prior as f64,
    ))
}

/// ISO-week buckets over the trailing `weeks` weeks, oldest first.
pub fn engagement_timeline(
    interactions: &[Interaction],
    as_of: DateTime<Utc>,
    weeks: u32,
) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = (0..weeks as i64)
        .rev()
        .map(|back| TimelineEntry {
            week: util::iso_week_key(as_of - Duration::weeks(back)),
            interaction_count: 0,
            by_type: BTreeMap::new(),
            highlights: Vec::new(),
        })
        .collect();
    let index: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .map(|(idx, e)| (e.week.clone(), idx))
        .collect();

    let mut ordered: Vec<&Interaction> = interactions
        .iter()
        .filter(|i| i.interaction_date <= as_of)
        .collect();
    ordered.sort_by(|a, b| {
        b.interaction_date
            .cmp(&a.interaction_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    for interaction in ordered {
        let Some(&idx) = index.get(&util::iso_week_key(interaction.interaction_date)) else {
            continue;
        };
        let entry = &mut entries[idx];
        entry.interaction_count += 1;
        *entry
            .by_type
            .entry(interaction.interaction_type.as_str().to_string())
            .or_default() += 1;
        if entry.highlights.len() < HIGHLIGHTS_PER_WEEK {
            if let Some(text) = interaction.outcome_text() {
                entry.highlights.push(text.to_string());
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::db::InteractionType;
    use crate::engagement::test_utils::{as_of, days_ago, interaction, relationship};

    #[test]
    fn test_distributor_summaries_sorted_by_engagement() {
        let rels = vec![
            relationship("d-quiet", "Alpha Foods", Some("West")),
            relationship("d-busy", "Zeta Supply", None),
        ];
        let mut list = Vec::new();
        for n in 0..4 {
            let mut i = interaction(&format!("b{n}"), InteractionType::Call, days_ago(n * 10));
            i.distributor_ids = vec!["d-busy".into()];
            list.push(i);
        }
        let mut old = interaction("q0", InteractionType::Meeting, days_ago(200));
        old.distributor_ids = vec!["d-quiet".into(), "d-busy".into()];
        list.push(old);

        let summaries = distributor_summaries(&rels, &list, as_of());
        assert_eq!(summaries[0].distributor_id, "d-busy");
        assert_eq!(summaries[0].interaction_count, 5);
        assert_eq!(summaries[0].recent_interactions, 4);
        assert_eq!(summaries[0].engagement_score, 40.0);
        assert_eq!(summaries[1].interaction_count, 1);
        assert_eq!(summaries[1].recent_interactions, 0);
        assert_eq!(summaries[1].last_interaction_date, Some(days_ago(200)));
        assert_eq!(summaries[1].territory.as_deref(), Some("West"));
    }

    #[test]
    fn test_communication_trends_buckets_oldest_first() {
        let mut june = interaction("j", InteractionType::Call, days_ago(2));
        june.duration_minutes = Some(20);
        june.outcome = Some("Signed the renewal".into());
        let list = vec![june, interaction("m", InteractionType::Email, days_ago(40))];

        let trends = communication_trends(&list, as_of(), 12, FrequencyTrend::Stable);
        assert_eq!(trends.monthly.len(), 12);
        assert_eq!(trends.monthly[0].month, "2024-07");
        let last = trends.monthly.last().unwrap();
        assert_eq!(last.month, "2025-06");
        assert_eq!(last.interaction_count, 1);
        assert_eq!(last.average_duration_minutes, Some(20.0));
        assert_eq!(last.positive_outcome_ratio, Some(100.0));
        assert_eq!(trends.monthly[10].interaction_count, 1);
        // Jan-Mar empty → no baseline
        assert_eq!(trends.period_change_percent, None);
    }

    #[test]
    fn test_period_change_percent() {
        let mut list = Vec::new();
        // Two in Feb (prior window Jan-Mar), four in May (recent window Apr-Jun)
        for n in 0..2 {
            let at = Utc.with_ymd_and_hms(2025, 2, 10 + n, 9, 0, 0).unwrap();
            list.push(interaction(&format!("p{n}"), InteractionType::Call, at));
        }
        for n in 0..4 {
            let at = Utc.with_ymd_and_hms(2025, 5, 10 + n, 9, 0, 0).unwrap();
            list.push(interaction(&format!("r{n}"), InteractionType::Call, at));
        }
        let trends = communication_trends(&list, as_of(), 12, FrequencyTrend::Increasing);
        assert_eq!(trends.period_change_percent, Some(100.0));
        assert_eq!(trends.direction, FrequencyTrend::Increasing);
    }

    #[test]
    fn test_timeline_groups_by_iso_week() {
        let mut a = interaction("a", InteractionType::Call, days_ago(0));
        a.outcome = Some("Agreed on pricing".into());
        let b = interaction("b", InteractionType::Call, days_ago(1));
        let c = interaction("c", InteractionType::Demo, days_ago(8));
        let ancient = interaction("z", InteractionType::Demo, days_ago(400));

        let timeline = engagement_timeline(&[a, b, c, ancient], as_of(), 12);
        assert_eq!(timeline.len(), 12);
        // as_of is Sunday 2025-06-15 → ISO week 24
        let current = timeline.last().unwrap();
        assert_eq!(current.week, "2025-W24");
        assert_eq!(current.interaction_count, 2);
        assert_eq!(current.by_type.get("call"), Some(&2));
        assert_eq!(current.highlights, vec!["Agreed on pricing".to_string()]);
        assert_eq!(timeline[10].week, "2025-W23");
        assert_eq!(timeline[10].interaction_count, 1);
        let total: usize = timeline.iter().map(|e| e.interaction_count).sum();
        assert_eq!(total, 3);
    }
}
