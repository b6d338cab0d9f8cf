//! Turns one analytics record into a prioritized action list.

use serde::{Deserialize, Serialize};

use super::health::ComponentName;
use super::risk::{GrowthIndicatorType, RiskType, Severity};
use super::PrincipalEngagementAnalytics;

const COMPONENT_ATTENTION_BELOW: f64 = 70.0;
const COMPONENT_URGENT_BELOW: f64 = 40.0;
const GROWTH_CONFIDENCE_ABOVE: f64 = 70.0;
const GROWTH_HIGH_ABOVE: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Communication,
    RiskMitigation,
    Growth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

impl From<Severity> for Priority {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Priority::Low,
            Severity::Medium => Priority::Medium,
            Severity::High => Priority::High,
            Severity::Critical => Priority::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub actions: Vec<String>,
}

fn component_title(name: ComponentName) -> &'static str {
    match name {
        ComponentName::Communication => "Improve communication cadence",
        ComponentName::Response => "Respond to follow-ups faster",
        ComponentName::Depth => "Deepen engagement",
        ComponentName::Consistency => "Stabilize monthly contact",
    }
}

fn component_actions(name: ComponentName) -> Vec<String> {
    let actions: &[&str] = match name {
        ComponentName::Communication => &[
            "Schedule recurring touchpoints",
            "Mix channels: calls, meetings and demos",
            "Record an outcome for every interaction",
        ],
        ComponentName::Response => &[
            "Assign an owner to each follow-up",
            "Reply within two business days",
        ],
        ComponentName::Depth => &[
            "Book longer working sessions",
            "Close follow-ups before their due date",
        ],
        ComponentName::Consistency => &["Plan a monthly contact calendar"],
    };
    actions.iter().map(|a| a.to_string()).collect()
}

fn risk_title(risk_type: RiskType) -> &'static str {
    match risk_type {
        RiskType::CommunicationGap => "Close the communication gap",
        RiskType::DecliningEngagement => "Reverse declining engagement",
        RiskType::ContractExpiration => "Secure contract renewal",
        RiskType::KeyContactDeparture => "Rebuild key contact coverage",
        RiskType::CompetitorActivity => "Counter competitor activity",
    }
}

fn growth_title(kind: GrowthIndicatorType) -> &'static str {
    match kind {
        GrowthIndicatorType::Upsell => "Pursue upsell opportunity",
        GrowthIndicatorType::TerritoryExpansion => "Expand territory coverage",
        GrowthIndicatorType::StrategicPartnership => "Propose a strategic partnership",
    }
}

/// Recommendations for one principal, highest priority first.
///
/// Sections the analytics record omits contribute nothing.
pub fn generate_recommendations(analytics: &PrincipalEngagementAnalytics) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(health) = &analytics.health {
        for component in &health.components {
            if component.score >= COMPONENT_ATTENTION_BELOW {
                continue;
            }
            let priority = if component.score < COMPONENT_URGENT_BELOW {
                Priority::High
            } else {
                Priority::Medium
            };
            recommendations.push(Recommendation {
                category: RecommendationCategory::Communication,
                priority,
                title: component_title(component.name).to_string(),
                description: format!(
                    "{} health is {:.0}/100",
                    component.name.as_str(),
                    component.score
                ),
                actions: component_actions(component.name),
            });
        }
    }

    for factor in analytics.risk_factors.iter().flatten() {
        if factor.severity < Severity::High {
            continue;
        }
        recommendations.push(Recommendation {
            category: RecommendationCategory::RiskMitigation,
            priority: factor.severity.into(),
            title: risk_title(factor.risk_type).to_string(),
            description: factor.description.clone(),
            actions: factor.mitigation.clone(),
        });
    }

    for growth in &analytics.growth_indicators {
        if growth.confidence <= GROWTH_CONFIDENCE_ABOVE {
            continue;
        }
        let priority = if growth.confidence > GROWTH_HIGH_ABOVE {
            Priority::High
        } else {
            Priority::Medium
        };
        recommendations.push(Recommendation {
            category: RecommendationCategory::Growth,
            priority,
            title: growth_title(growth.indicator_type).to_string(),
            description: growth.description.clone(),
            actions: growth.recommended_actions.clone(),
        });
    }

    // Stable: equal priorities keep the order they were generated in
    recommendations.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::health::{
        HealthComponent, HealthMetrics, HealthTrend, PartnershipDepth, RelationshipMaturity,
        TrustLevel,
    };
    use crate::engagement::risk::{GrowthIndicator, RiskFactor};
    use crate::engagement::test_utils::{as_of, empty_analytics};

    fn component(name: ComponentName, score: f64) -> HealthComponent {
        HealthComponent {
            name,
            score,
            weight: name.weight(),
            trend: HealthTrend::Stable,
            indicators: Vec::new(),
            improvement_potential: 100.0 - score,
        }
    }

    fn risk(risk_type: RiskType, severity: Severity) -> RiskFactor {
        RiskFactor {
            risk_type,
            severity,
            probability: 0.5,
            impact_score: 50.0,
            description: format!("{:?}", risk_type),
            evidence: Vec::new(),
            mitigation: vec!["act".into()],
        }
    }

    fn growth(confidence: f64) -> GrowthIndicator {
        GrowthIndicator {
            indicator_type: GrowthIndicatorType::Upsell,
            confidence,
            distributor_id: None,
            description: "upsell".into(),
            evidence: Vec::new(),
            recommended_actions: Vec::new(),
            potential_value: None,
        }
    }

    #[test]
    fn test_recommendations_sorted_by_priority() {
        let mut analytics = empty_analytics("p-1", as_of());
        analytics.health = Some(HealthMetrics {
            components: vec![
                component(ComponentName::Communication, 55.0),
                component(ComponentName::Response, 20.0),
                component(ComponentName::Depth, 90.0),
                component(ComponentName::Consistency, 65.0),
            ],
            overall_score: 56.0,
            health_trend: HealthTrend::Stable,
            trust_level: TrustLevel::Medium,
            partnership_depth: PartnershipDepth::Collaborative,
            relationship_maturity: RelationshipMaturity::Developing,
        });
        analytics.risk_factors = Some(vec![
            risk(RiskType::CommunicationGap, Severity::Medium),
            risk(RiskType::ContractExpiration, Severity::Critical),
            risk(RiskType::CompetitorActivity, Severity::High),
        ]);
        analytics.growth_indicators = vec![growth(90.0), growth(70.0), growth(75.0)];

        let recs = generate_recommendations(&analytics);
        let ranks: Vec<u8> = recs.iter().map(|r| r.priority.rank()).collect();
        let mut sorted = ranks.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(ranks, sorted);

        // 3 weak components, 2 severe risks, 2 confident growth signals
        assert_eq!(recs.len(), 7);
        assert_eq!(recs[0].priority, Priority::Critical);
        assert_eq!(recs[0].category, RecommendationCategory::RiskMitigation);

        // Within the high band generation order is kept: response, competitor, upsell
        let high: Vec<RecommendationCategory> = recs
            .iter()
            .filter(|r| r.priority == Priority::High)
            .map(|r| r.category)
            .collect();
        assert_eq!(
            high,
            vec![
                RecommendationCategory::Communication,
                RecommendationCategory::RiskMitigation,
                RecommendationCategory::Growth,
            ]
        );
    }

    #[test]
    fn test_no_sections_no_recommendations() {
        let analytics = empty_analytics("p-1", as_of());
        assert!(generate_recommendations(&analytics).is_empty());
    }
}
