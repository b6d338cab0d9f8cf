//! Risk factors, churn signals and growth opportunities.
//!
//! Each check is an independent function over the principal's loaded
//! context. `detect_risk_factors` runs every risk check; `risk_score`
//! collapses them into a single 0–100 number.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::health::{HealthMetrics, RelationshipMaturity};
use super::patterns::{self, FrequencyPattern, FrequencyTrend};
use super::sentiment;
use super::timeline::DistributorSummary;
use crate::db::{Contact, DistributorRelationship, Interaction};
use crate::util;

const WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Multiplier applied in the overall risk score.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Low => 0.25,
            Severity::Medium => 0.5,
            Severity::High => 0.75,
            Severity::Critical => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    CommunicationGap,
    DecliningEngagement,
    ContractExpiration,
    KeyContactDeparture,
    CompetitorActivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub risk_type: RiskType,
    pub severity: Severity,
    pub probability: f64,
    pub impact_score: f64,
    pub description: String,
    pub evidence: Vec<String>,
    pub mitigation: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnIndicatorType {
    DecliningFrequency,
    ResponseTimeDegradation,
    SentimentDecline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnIndicator {
    pub indicator_type: ChurnIndicatorType,
    pub confidence: f64,
    pub description: String,
    pub evidence: Vec<String>,
    pub recommended_actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthIndicatorType {
    Upsell,
    TerritoryExpansion,
    StrategicPartnership,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthIndicator {
    pub indicator_type: GrowthIndicatorType,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributor_id: Option<String>,
    pub description: String,
    pub evidence: Vec<String>,
    pub recommended_actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potential_value: Option<f64>,
}

// =============================================================================
// Risk factors
// =============================================================================

/// Everything the risk checks read.
pub struct RiskInputs<'a> {
    pub interactions: &'a [Interaction],
    pub relationships: &'a [DistributorRelationship],
    pub contacts: &'a [Contact],
    pub frequency: &'a FrequencyPattern,
    pub as_of: DateTime<Utc>,
}

/// Run every risk check. Contract expirations come out in relationship order.
pub fn detect_risk_factors(inputs: &RiskInputs<'_>) -> Vec<RiskFactor> {
    let mut factors = Vec::new();
    factors.extend(communication_gap(inputs.interactions, inputs.as_of));
    factors.extend(declining_engagement(inputs.frequency));
    factors.extend(contract_expirations(inputs.relationships, inputs.as_of));
    factors.extend(key_contact_departure(inputs.contacts, inputs.as_of));
    factors.extend(competitor_activity(inputs.interactions, inputs.as_of));
    factors
}

pub fn communication_gap(interactions: &[Interaction], as_of: DateTime<Utc>) -> Option<RiskFactor> {
    let last = interactions.iter().map(|i| i.interaction_date).max()?;
    let days = util::days_between(last, as_of).floor();
    let (severity, impact) = if days > 90.0 {
        (Severity::Critical, 80.0)
    } else if days > 60.0 {
        (Severity::High, 60.0)
    } else if days > 30.0 {
        (Severity::Medium, 40.0)
    } else {
        return None;
    };

    Some(RiskFactor {
        risk_type: RiskType::CommunicationGap,
        severity,
        probability: util::round2((days / 120.0).min(1.0)),
        impact_score: impact,
        description: format!("No interaction logged for {} days", days),
        evidence: vec![format!("Last interaction on {}", last.format("%Y-%m-%d"))],
        mitigation: vec![
            "Schedule a check-in call with the principal".to_string(),
            "Review open opportunities for a reason to reconnect".to_string(),
        ],
    })
}

pub fn declining_engagement(frequency: &FrequencyPattern) -> Option<RiskFactor> {
    if frequency.trend != FrequencyTrend::Decreasing || frequency.historical_average <= 0.0 {
        return None;
    }
    let ratio = frequency.current_frequency / frequency.historical_average;
    let severity = if ratio < 0.5 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(RiskFactor {
        risk_type: RiskType::DecliningEngagement,
        severity,
        probability: util::round2((1.0 - ratio).clamp(0.1, 1.0)),
        impact_score: 60.0,
        description: format!(
            "Interaction frequency is down to {:.0}% of the historical average",
            ratio * 100.0
        ),
        evidence: vec![
            format!("Current: {:.2} per month", frequency.current_frequency),
            format!("Historical: {:.2} per month", frequency.historical_average),
        ],
        mitigation: vec![
            "Agree a regular meeting cadence".to_string(),
            "Ask what changed on the principal's side".to_string(),
        ],
    })
}

pub fn contract_expirations(
    relationships: &[DistributorRelationship],
    as_of: DateTime<Utc>,
) -> Vec<RiskFactor> {
    let today = as_of.date_naive();
    relationships
        .iter()
        .filter(|rel| rel.is_active)
        .filter_map(|rel| {
            let end = rel.contract_end?;
            let days = util::days_until(today, end);
            let (severity, probability) = match days {
                d if d < 0 => (Severity::Critical, 0.9),
                0..=30 => (Severity::High, 0.8),
                31..=60 => (Severity::Medium, 0.6),
                61..=90 => (Severity::Low, 0.4),
                _ => return None,
            };
            let commitment = rel.annual_volume_commitment.unwrap_or(0.0).max(0.0);
            let description = if days < 0 {
                format!("Contract with {} expired {} days ago", rel.distributor_name, -days)
            } else {
                format!("Contract with {} expires in {} days", rel.distributor_name, days)
            };

            let mut evidence = vec![format!("Contract end {}", end)];
            if let Some(volume) = rel.annual_volume_commitment {
                evidence.push(format!("Annual volume commitment {:.0}", volume));
            }
            Some(RiskFactor {
                risk_type: RiskType::ContractExpiration,
                severity,
                probability,
                impact_score: util::round2(50.0 + (commitment / 25_000.0).min(40.0)),
                description,
                evidence,
                mitigation: vec![
                    format!("Start renewal talks with {}", rel.distributor_name),
                    "Prepare a volume and performance review".to_string(),
                ],
            })
        })
        .collect()
}

pub fn key_contact_departure(contacts: &[Contact], as_of: DateTime<Utc>) -> Option<RiskFactor> {
    let since = as_of - Duration::days(WINDOW_DAYS);
    let departed: Vec<&Contact> = contacts
        .iter()
        .filter(|c| matches!(c.deleted_at, Some(at) if at > since && at <= as_of))
        .collect();
    if departed.is_empty() {
        return None;
    }

    let primary = departed.iter().any(|c| c.is_primary);
    let (severity, impact) = if primary {
        (Severity::High, 70.0)
    } else {
        (Severity::Medium, 45.0)
    };

    Some(RiskFactor {
        risk_type: RiskType::KeyContactDeparture,
        severity,
        probability: 0.7,
        impact_score: impact,
        description: format!("{} contact(s) left in the last 90 days", departed.len()),
        evidence: departed
            .iter()
            .map(|c| {
                if c.is_primary {
                    format!("{} (primary contact)", c.name)
                } else {
                    c.name.clone()
                }
            })
            .collect(),
        mitigation: vec![
            "Identify and introduce yourself to the replacement".to_string(),
            "Map additional stakeholders at the principal".to_string(),
        ],
    })
}

pub fn competitor_activity(interactions: &[Interaction], as_of: DateTime<Utc>) -> Option<RiskFactor> {
    let since = as_of - Duration::days(WINDOW_DAYS);
    let mentions: Vec<&str> = interactions
        .iter()
        .filter(|i| i.interaction_date > since && i.interaction_date <= as_of)
        .filter_map(|i| i.outcome_text())
        .filter(|text| sentiment::mentions_competitor(text))
        .collect();
    if mentions.is_empty() {
        return None;
    }

    let severity = if mentions.len() >= 2 {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(RiskFactor {
        risk_type: RiskType::CompetitorActivity,
        severity,
        probability: util::round2((0.4 + 0.2 * mentions.len() as f64).min(1.0)),
        impact_score: 65.0,
        description: format!(
            "Competitor mentioned in {} interaction(s) in the last 90 days",
            mentions.len()
        ),
        evidence: mentions.iter().map(|m| m.to_string()).collect(),
        mitigation: vec![
            "Reinforce the value proposition against the named alternative".to_string(),
            "Escalate pricing or programme support if needed".to_string(),
        ],
    })
}

/// Mean of `probability × severity weight × impact` over all factors.
///
/// 0 when nothing was detected. Raising any single factor's severity,
/// probability or impact never lowers the result.
pub fn risk_score(factors: &[RiskFactor]) -> f64 {
    if factors.is_empty() {
        return 0.0;
    }
    let total: f64 = factors
        .iter()
        .map(|f| f.probability.clamp(0.0, 1.0) * f.severity.weight() * util::clamp_score(f.impact_score))
        .sum();
    util::clamp_score((total / factors.len() as f64).round())
}

// =============================================================================
// Churn indicators
// =============================================================================

/// Compare the last 90 days against the 90 days before.
pub fn churn_indicators(interactions: &[Interaction], as_of: DateTime<Utc>) -> Vec<ChurnIndicator> {
    let mid = as_of - Duration::days(WINDOW_DAYS);
    let start = mid - Duration::days(WINDOW_DAYS);
    let recent: Vec<Interaction> = window(interactions, mid, as_of);
    let prior: Vec<Interaction> = window(interactions, start, mid);

    let mut indicators = Vec::new();

    // 1. Volume
    let (r, p) = (recent.len() as f64, prior.len() as f64);
    if prior.len() >= 2 && r < 0.7 * p {
        indicators.push(ChurnIndicator {
            indicator_type: ChurnIndicatorType::DecliningFrequency,
            confidence: util::round2((100.0 * (1.0 - r / p)).min(95.0)),
            description: "Interaction volume dropped against the previous quarter".to_string(),
            evidence: vec![
                format!("{} interactions in the last 90 days", recent.len()),
                format!("{} interactions in the 90 days before", prior.len()),
            ],
            recommended_actions: vec![
                "Book a business review with the principal".to_string(),
                "Re-establish a regular touchpoint cadence".to_string(),
            ],
        });
    }

    // 2. Response times
    let recent_hours = util::mean(&patterns::response_hours(&recent).1);
    let prior_hours = util::mean(&patterns::response_hours(&prior).1);
    if let (Some(now), Some(before)) = (recent_hours, prior_hours) {
        if before > 0.0 && now > before * 1.25 {
            let increase_pct = 100.0 * (now - before) / before;
            indicators.push(ChurnIndicator {
                indicator_type: ChurnIndicatorType::ResponseTimeDegradation,
                confidence: util::round2((50.0 + increase_pct / 2.0).min(95.0)),
                description: format!("Follow-up response time slowed by {:.0}%", increase_pct),
                evidence: vec![
                    format!("Recent average {:.1} hours", now),
                    format!("Previous average {:.1} hours", before),
                ],
                recommended_actions: vec![
                    "Set explicit follow-up owners and due dates".to_string(),
                ],
            });
        }
    }

    // 3. Sentiment
    let recent_outcomes: Vec<&str> = recent.iter().filter_map(|i| i.outcome_text()).collect();
    let prior_outcomes: Vec<&str> = prior.iter().filter_map(|i| i.outcome_text()).collect();
    if recent_outcomes.len() >= 2 && prior_outcomes.len() >= 2 {
        let now = sentiment::positivity_ratio(recent_outcomes.iter().copied()).unwrap_or(0.0);
        let before = sentiment::positivity_ratio(prior_outcomes.iter().copied()).unwrap_or(0.0);
        let drop = before - now;
        if drop > 20.0 {
            indicators.push(ChurnIndicator {
                indicator_type: ChurnIndicatorType::SentimentDecline,
                confidence: util::round2((40.0 + drop).min(95.0)),
                description: format!("Positive outcomes fell by {:.0} points", drop),
                evidence: vec![
                    format!("{:.0}% positive in the last 90 days", now),
                    format!("{:.0}% positive in the 90 days before", before),
                ],
                recommended_actions: vec![
                    "Review recent outcomes with the account owner".to_string(),
                    "Address open issues before the next order cycle".to_string(),
                ],
            });
        }
    }

    indicators
}

fn window(interactions: &[Interaction], after: DateTime<Utc>, until: DateTime<Utc>) -> Vec<Interaction> {
    interactions
        .iter()
        .filter(|i| i.interaction_date > after && i.interaction_date <= until)
        .cloned()
        .collect()
}

// =============================================================================
// Growth indicators
// =============================================================================

pub struct GrowthInputs<'a> {
    pub interactions: &'a [Interaction],
    pub frequency: &'a FrequencyPattern,
    pub health: &'a HealthMetrics,
    pub distributors: &'a [DistributorSummary],
    pub as_of: DateTime<Utc>,
}

pub fn growth_indicators(inputs: &GrowthInputs<'_>) -> Vec<GrowthIndicator> {
    let mut indicators = Vec::new();
    indicators.extend(upsell(inputs));
    indicators.extend(territory_expansion(inputs.distributors));
    indicators.extend(strategic_partnership(inputs));
    indicators
}

/// Positive recent outcomes on a relationship that is not cooling off.
fn upsell(inputs: &GrowthInputs<'_>) -> Option<GrowthIndicator> {
    let recent = window(inputs.interactions, inputs.as_of - Duration::days(WINDOW_DAYS), inputs.as_of);
    if recent.len() < 3 || inputs.frequency.trend == FrequencyTrend::Decreasing {
        return None;
    }
    let positivity = sentiment::positivity_ratio(recent.iter().filter_map(|i| i.outcome_text()))?;
    if positivity < 60.0 {
        return None;
    }

    Some(GrowthIndicator {
        indicator_type: GrowthIndicatorType::Upsell,
        confidence: util::round2((positivity * 0.8 + recent.len() as f64 * 2.0).min(95.0)),
        distributor_id: None,
        description: "Recent interactions are consistently positive".to_string(),
        evidence: vec![
            format!("{:.0}% positive outcomes in the last 90 days", positivity),
            format!("{} interactions in the last 90 days", recent.len()),
        ],
        recommended_actions: vec![
            "Present complementary product lines".to_string(),
            "Propose a volume tier upgrade".to_string(),
        ],
        potential_value: None,
    })
}

fn territory_expansion(distributors: &[DistributorSummary]) -> Vec<GrowthIndicator> {
    distributors
        .iter()
        .filter(|d| d.recent_interactions >= 5)
        .filter_map(|d| {
            let territory = d.territory.as_deref()?;
            Some(GrowthIndicator {
                indicator_type: GrowthIndicatorType::TerritoryExpansion,
                confidence: util::round2((50.0 + d.recent_interactions as f64 * 5.0).min(95.0)),
                distributor_id: Some(d.distributor_id.clone()),
                description: format!(
                    "{} is highly active in {}",
                    d.distributor_name, territory
                ),
                evidence: vec![format!(
                    "{} interactions in the last 90 days",
                    d.recent_interactions
                )],
                recommended_actions: vec![
                    format!("Explore adjacent territories with {}", d.distributor_name),
                ],
                potential_value: d.annual_volume_commitment.map(|v| util::round2(v * 0.2)),
            })
        })
        .collect()
}

fn strategic_partnership(inputs: &GrowthInputs<'_>) -> Option<GrowthIndicator> {
    let health = inputs.health;
    let high_touch = inputs
        .interactions
        .iter()
        .filter(|i| i.interaction_type.is_high_touch())
        .count();
    if health.overall_score < 75.0
        || health.relationship_maturity != RelationshipMaturity::Established
        || high_touch < 6
    {
        return None;
    }

    Some(GrowthIndicator {
        indicator_type: GrowthIndicatorType::StrategicPartnership,
        confidence: health.overall_score,
        distributor_id: None,
        description: "Mature, healthy relationship with sustained high-touch engagement".to_string(),
        evidence: vec![
            format!("Overall health {:.0}", health.overall_score),
            format!("{} meetings, demos or proposals", high_touch),
        ],
        recommended_actions: vec![
            "Propose joint business planning".to_string(),
            "Explore co-marketing or exclusive programmes".to_string(),
        ],
        potential_value: None,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::db::InteractionType;
    use crate::engagement::health::{score_health, HealthTrend, PartnershipDepth, TrustLevel};
    use crate::engagement::patterns::frequency_pattern;
    use crate::engagement::test_utils::{as_of, days_ago, interaction, relationship};

    fn factor(severity: Severity, probability: f64, impact: f64) -> RiskFactor {
        RiskFactor {
            risk_type: RiskType::CommunicationGap,
            severity,
            probability,
            impact_score: impact,
            description: String::new(),
            evidence: Vec::new(),
            mitigation: Vec::new(),
        }
    }

    #[test]
    fn test_risk_score_empty_is_zero() {
        assert_eq!(risk_score(&[]), 0.0);
    }

    #[test]
    fn test_risk_score_monotone_in_each_dimension() {
        let other = factor(Severity::Medium, 0.5, 50.0);
        let base = risk_score(&[factor(Severity::Low, 0.4, 40.0), other.clone()]);

        let severities = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];
        let mut last = base;
        for s in severities {
            let score = risk_score(&[factor(s, 0.4, 40.0), other.clone()]);
            assert!(score >= last, "{:?}: {} < {}", s, score, last);
            last = score;
        }
        assert!(risk_score(&[factor(Severity::Low, 0.9, 40.0), other.clone()]) >= base);
        assert!(risk_score(&[factor(Severity::Low, 0.4, 90.0), other]) >= base);
    }

    #[test]
    fn test_communication_gap_thresholds() {
        assert!(communication_gap(&[], as_of()).is_none());
        let recent = [interaction("a", InteractionType::Call, days_ago(10))];
        assert!(communication_gap(&recent, as_of()).is_none());

        let stale = [interaction("a", InteractionType::Call, days_ago(45))];
        let f = communication_gap(&stale, as_of()).unwrap();
        assert_eq!(f.severity, Severity::Medium);
        assert_eq!(f.impact_score, 40.0);

        let gone = [interaction("a", InteractionType::Call, days_ago(150))];
        let f = communication_gap(&gone, as_of()).unwrap();
        assert_eq!(f.severity, Severity::Critical);
        assert_eq!(f.probability, 1.0);
    }

    #[test]
    fn test_contract_expiration_bands() {
        let mut expired = relationship("d1", "North", None);
        expired.contract_end = Some(days_ago(3).date_naive());
        expired.annual_volume_commitment = Some(2_000_000.0);
        let mut soon = relationship("d2", "South", None);
        soon.contract_end = Some(days_ago(-20).date_naive());
        let mut later = relationship("d3", "East", None);
        later.contract_end = Some(days_ago(-75).date_naive());
        let mut far = relationship("d4", "West", None);
        far.contract_end = Some(days_ago(-400).date_naive());

        let factors = contract_expirations(&[expired, soon, later, far], as_of());
        let severities: Vec<Severity> = factors.iter().map(|f| f.severity).collect();
        assert_eq!(severities, vec![Severity::Critical, Severity::High, Severity::Low]);
        // Commitment contribution caps at 40
        assert_eq!(factors[0].impact_score, 90.0);
        assert_eq!(factors[1].impact_score, 50.0);
    }

    #[test]
    fn test_key_contact_departure() {
        let contact = |id: &str, primary: bool, left: Option<DateTime<Utc>>| Contact {
            id: id.into(),
            organization_id: "p-1".into(),
            name: format!("Contact {id}"),
            email: None,
            is_primary: primary,
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            deleted_at: left,
        };
        let contacts = vec![
            contact("a", false, Some(days_ago(20))),
            contact("b", true, Some(days_ago(200))),
            contact("c", true, None),
        ];
        let f = key_contact_departure(&contacts, as_of()).unwrap();
        assert_eq!(f.severity, Severity::Medium);
        assert_eq!(f.impact_score, 45.0);

        let contacts = vec![contact("b", true, Some(days_ago(5)))];
        let f = key_contact_departure(&contacts, as_of()).unwrap();
        assert_eq!(f.severity, Severity::High);
        assert_eq!(f.impact_score, 70.0);
    }

    #[test]
    fn test_competitor_activity() {
        let mut a = interaction("a", InteractionType::Call, days_ago(5));
        a.outcome = Some("Buyer mentioned a competitor offer".into());
        let mut b = interaction("b", InteractionType::Call, days_ago(30));
        b.outcome = Some("Considering switching suppliers".into());
        let mut old = interaction("c", InteractionType::Call, days_ago(120));
        old.outcome = Some("Competitor visited".into());

        let f = competitor_activity(&[a.clone(), old.clone()], as_of()).unwrap();
        assert_eq!(f.severity, Severity::Medium);
        assert_eq!(f.probability, 0.6);

        let f = competitor_activity(&[a, b, old], as_of()).unwrap();
        assert_eq!(f.severity, Severity::High);
        assert_eq!(f.evidence.len(), 2);
    }

    #[test]
    fn test_declining_engagement_from_frequency() {
        let mut list: Vec<Interaction> = (0..24)
            .map(|n| interaction(&format!("o{n}"), InteractionType::Call, days_ago(365 + n * 10)))
            .collect();
        list.push(interaction("r", InteractionType::Call, days_ago(3)));
        let freq = frequency_pattern(&list, as_of());
        let f = declining_engagement(&freq).unwrap();
        assert_eq!(f.severity, Severity::High);
        assert!(f.probability >= 0.1 && f.probability <= 1.0);
    }

    #[test]
    fn test_churn_indicators() {
        let mut list = Vec::new();
        // Prior quarter: 6 interactions, positive, follow-ups answered in 12 days
        for n in 0..6 {
            let mut i = interaction(&format!("p{n}"), InteractionType::Call, days_ago(100 + n * 12));
            i.outcome = Some("Great progress".into());
            i.follow_up_required = n % 2 == 1;
            list.push(i);
        }
        // Recent quarter: 2 interactions, negative, slow reply
        let mut ask = interaction("r0", InteractionType::Email, days_ago(60));
        ask.outcome = Some("Pricing complaint".into());
        ask.follow_up_required = true;
        let mut reply = interaction("r1", InteractionType::Call, days_ago(30));
        reply.outcome = Some("Still unhappy with delivery".into());
        list.push(ask);
        list.push(reply);

        let indicators = churn_indicators(&list, as_of());
        let kinds: Vec<ChurnIndicatorType> = indicators.iter().map(|c| c.indicator_type).collect();
        assert!(kinds.contains(&ChurnIndicatorType::DecliningFrequency));
        assert!(kinds.contains(&ChurnIndicatorType::ResponseTimeDegradation));
        assert!(kinds.contains(&ChurnIndicatorType::SentimentDecline));
        for c in &indicators {
            assert!(c.confidence <= 95.0);
        }
    }

    #[test]
    fn test_growth_indicators() {
        let mut list = Vec::new();
        for n in 0..40 {
            let kind = if n % 2 == 0 { InteractionType::Meeting } else { InteractionType::Call };
            let mut i = interaction(&format!("i{n:02}"), kind, days_ago(n * 20 + 1));
            i.outcome = Some("Excellent meeting".into());
            i.duration_minutes = Some(60);
            i.distributor_ids = vec!["d1".into()];
            list.push(i);
        }
        let freq = frequency_pattern(&list, as_of());
        let health = score_health(&list, 1, as_of());
        let summary = DistributorSummary {
            distributor_id: "d1".into(),
            distributor_name: "North".into(),
            territory: Some("Midwest".into()),
            contract_end: None,
            annual_volume_commitment: Some(100_000.0),
            interaction_count: 40,
            recent_interactions: 6,
            last_interaction_date: Some(days_ago(1)),
            engagement_score: 60.0,
        };
        let inputs = GrowthInputs {
            interactions: &list,
            frequency: &freq,
            health: &health,
            distributors: std::slice::from_ref(&summary),
            as_of: as_of(),
        };
        let indicators = growth_indicators(&inputs);
        let upsell = indicators
            .iter()
            .find(|g| g.indicator_type == GrowthIndicatorType::Upsell)
            .unwrap();
        // 100% positive × 0.8 + 5 recent × 2
        assert_eq!(upsell.confidence, 90.0);

        let expansion = indicators
            .iter()
            .find(|g| g.indicator_type == GrowthIndicatorType::TerritoryExpansion)
            .unwrap();
        assert_eq!(expansion.confidence, 80.0);
        assert_eq!(expansion.potential_value, Some(20_000.0));
        assert_eq!(expansion.distributor_id.as_deref(), Some("d1"));
    }

    fn health_of(overall: f64, maturity: RelationshipMaturity) -> HealthMetrics {
        HealthMetrics {
            components: Vec::new(),
            overall_score: overall,
            health_trend: HealthTrend::Stable,
            trust_level: TrustLevel::High,
            partnership_depth: PartnershipDepth::Strategic,
            relationship_maturity: maturity,
        }
    }

    fn frequency_of(trend: FrequencyTrend) -> FrequencyPattern {
        FrequencyPattern {
            current_frequency: 2.0,
            historical_average: 2.0,
            trend,
            interactions_last_30_days: 1,
            interactions_last_90_days: 3,
        }
    }

    /// `high_touch` meetings then `calls` calls, one every 30 days, all positive.
    fn history(high_touch: i64, calls: i64) -> Vec<Interaction> {
        (0..high_touch + calls)
            .map(|n| {
                let kind = if n < high_touch { InteractionType::Meeting } else { InteractionType::Call };
                let mut i = interaction(&format!("i{n:02}"), kind, days_ago(n * 30 + 1));
                i.outcome = Some("Great meeting".into());
                i
            })
            .collect()
    }

    fn summary(territory: Option<&str>, recent: usize) -> DistributorSummary {
        DistributorSummary {
            distributor_id: "d1".into(),
            distributor_name: "North".into(),
            territory: territory.map(str::to_string),
            contract_end: None,
            annual_volume_commitment: None,
            interaction_count: recent,
            recent_interactions: recent,
            last_interaction_date: Some(days_ago(1)),
            engagement_score: (recent as f64 * 10.0).min(100.0),
        }
    }

    fn partnership(list: &[Interaction], health: &HealthMetrics) -> Option<GrowthIndicator> {
        let freq = frequency_of(FrequencyTrend::Stable);
        strategic_partnership(&GrowthInputs {
            interactions: list,
            frequency: &freq,
            health,
            distributors: &[],
            as_of: as_of(),
        })
    }

    #[test]
    fn test_strategic_partnership_for_healthy_established_account() {
        let list = history(6, 2);
        let health = health_of(82.5, RelationshipMaturity::Established);
        let freq = frequency_of(FrequencyTrend::Stable);
        let indicators = growth_indicators(&GrowthInputs {
            interactions: &list,
            frequency: &freq,
            health: &health,
            distributors: &[],
            as_of: as_of(),
        });

        let strategic = indicators
            .iter()
            .find(|g| g.indicator_type == GrowthIndicatorType::StrategicPartnership)
            .expect("strategic partnership");
        assert_eq!(strategic.confidence, 82.5);
        assert!(strategic.distributor_id.is_none());
        assert!(strategic.evidence.iter().any(|e| e.starts_with("6 meetings")));
    }

    #[test]
    fn test_strategic_partnership_gates() {
        let established = health_of(80.0, RelationshipMaturity::Established);
        assert!(partnership(&history(6, 0), &established).is_some());
        assert_eq!(
            partnership(&history(6, 0), &health_of(75.0, RelationshipMaturity::Established))
                .map(|g| g.confidence),
            Some(75.0)
        );

        // Health just under the bar
        let weak = health_of(74.9, RelationshipMaturity::Established);
        assert!(partnership(&history(6, 0), &weak).is_none());

        // Healthy but not yet established
        let developing = health_of(90.0, RelationshipMaturity::Developing);
        assert!(partnership(&history(6, 0), &developing).is_none());

        // Plenty of activity, but only five meetings
        assert!(partnership(&history(5, 10), &established).is_none());
    }

    #[test]
    fn test_upsell_requires_non_decreasing_trend() {
        let list = history(3, 0);
        let health = health_of(60.0, RelationshipMaturity::New);
        let inputs = |freq: &FrequencyPattern| {
            upsell(&GrowthInputs {
                interactions: &list,
                frequency: freq,
                health: &health,
                distributors: &[],
                as_of: as_of(),
            })
        };

        let steady = inputs(&frequency_of(FrequencyTrend::Stable)).expect("upsell when stable");
        // 100% positive × 0.8 + 3 recent × 2
        assert_eq!(steady.confidence, 86.0);
        assert!(inputs(&frequency_of(FrequencyTrend::Increasing)).is_some());
        assert!(inputs(&frequency_of(FrequencyTrend::Decreasing)).is_none());
    }

    #[test]
    fn test_territory_expansion_needs_territory_and_activity() {
        assert!(territory_expansion(&[summary(None, 8)]).is_empty());
        assert!(territory_expansion(&[summary(Some("Midwest"), 4)]).is_empty());

        let found = territory_expansion(&[summary(None, 9), summary(Some("Midwest"), 5)]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].confidence, 75.0);
        assert_eq!(found[0].potential_value, None);
    }
}
