//! JSON and CSV renderings of engagement analytics.

use crate::engagement::PrincipalEngagementAnalytics;

const CSV_HEADER: &[&str] = &[
    "principal_id",
    "principal_name",
    "generated_at",
    "total_interactions",
    "distributor_count",
    "overall_health",
    "trust_level",
    "frequency_trend",
    "risk_score",
    "risk_factors",
    "churn_indicators",
    "growth_indicators",
    "first_interaction_date",
    "last_interaction_date",
];

/// Pretty-printed JSON of one analytics record (camelCase keys).
pub fn to_json(analytics: &PrincipalEngagementAnalytics) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(analytics)
}

/// One summary row per principal, CRLF line endings, RFC 4180 quoting.
///
/// Sections that were not computed render as empty cells.
pub fn to_csv(rows: &[PrincipalEngagementAnalytics]) -> String {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));
    for a in rows {
        push_record(
            &mut out,
            [
                a.principal_id.clone(),
                a.principal_name.clone(),
                a.generated_at.to_rfc3339(),
                a.total_interactions.to_string(),
                a.distributor_count.to_string(),
                a.health
                    .as_ref()
                    .map(|h| h.overall_score.to_string())
                    .unwrap_or_default(),
                a.health
                    .as_ref()
                    .map(|h| h.trust_level.as_str().to_string())
                    .unwrap_or_default(),
                a.patterns
                    .as_ref()
                    .map(|p| p.frequency.trend.as_str().to_string())
                    .unwrap_or_default(),
                a.risk_score.to_string(),
                a.risk_factors
                    .as_ref()
                    .map(|r| r.len().to_string())
                    .unwrap_or_default(),
                a.churn_indicators.len().to_string(),
                a.growth_indicators.len().to_string(),
                a.first_interaction_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default(),
                a.last_interaction_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default(),
            ],
        );
    }
    out
}

fn push_record(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let line = fields
        .into_iter()
        .map(|f| escape_field(&f))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
