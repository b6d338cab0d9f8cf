//! Shared type definitions for the database layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to record store operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Blocking store task failed: {0}")]
    Task(String),

    #[error("Record store unavailable: {0}")]
    Backend(String),
}

/// Role an organization plays in the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationType {
    Principal,
    Distributor,
    Customer,
    Prospect,
    Vendor,
    Other,
}

impl OrganizationType {
    /// String label for SQL storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::Principal => "principal",
            OrganizationType::Distributor => "distributor",
            OrganizationType::Customer => "customer",
            OrganizationType::Prospect => "prospect",
            OrganizationType::Vendor => "vendor",
            OrganizationType::Other => "other",
        }
    }

    /// Parse from SQL string.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "principal" => OrganizationType::Principal,
            "distributor" => OrganizationType::Distributor,
            "customer" => OrganizationType::Customer,
            "prospect" => OrganizationType::Prospect,
            "vendor" => OrganizationType::Vendor,
            _ => OrganizationType::Other,
        }
    }
}

/// Kind of logged touchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Call,
    Email,
    Meeting,
    Demo,
    Proposal,
    Contract,
    Support,
    FollowUp,
    Other,
}

impl InteractionType {
    pub const ALL: [InteractionType; 9] = [
        InteractionType::Call,
        InteractionType::Email,
        InteractionType::Meeting,
        InteractionType::Demo,
        InteractionType::Proposal,
        InteractionType::Contract,
        InteractionType::Support,
        InteractionType::FollowUp,
        InteractionType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Call => "call",
            InteractionType::Email => "email",
            InteractionType::Meeting => "meeting",
            InteractionType::Demo => "demo",
            InteractionType::Proposal => "proposal",
            InteractionType::Contract => "contract",
            InteractionType::Support => "support",
            InteractionType::FollowUp => "follow_up",
            InteractionType::Other => "other",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "call" => InteractionType::Call,
            "email" => InteractionType::Email,
            "meeting" => InteractionType::Meeting,
            "demo" => InteractionType::Demo,
            "proposal" => InteractionType::Proposal,
            "contract" => InteractionType::Contract,
            "support" => InteractionType::Support,
            "follow_up" | "follow-up" | "followup" => InteractionType::FollowUp,
            _ => InteractionType::Other,
        }
    }

    /// Face-to-face or solution-level touchpoints.
    pub fn is_high_touch(&self) -> bool {
        matches!(
            self,
            InteractionType::Meeting | InteractionType::Demo | InteractionType::Proposal
        )
    }
}

/// A row from the `organizations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub organization_type: OrganizationType,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A row from `distributor_relationships`, with the distributor's name embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributorRelationship {
    pub id: String,
    pub principal_id: String,
    pub distributor_id: String,
    pub distributor_name: String,
    pub is_active: bool,
    pub territory: Option<String>,
    pub contract_start: Option<NaiveDate>,
    pub contract_end: Option<NaiveDate>,
    pub annual_volume_commitment: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `contacts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub email: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A row from the `opportunities` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub name: String,
    pub stage: String,
    pub estimated_value: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// How an organization takes part in an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Principal,
    Distributor,
    Customer,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Principal => "principal",
            ParticipantRole::Distributor => "distributor",
            ParticipantRole::Customer => "customer",
        }
    }
}

/// A row from the `interactions` table.
///
/// `distributor_ids` is embedded at load time from the distributor
/// participants of the interaction's opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,
    pub organization_id: String,
    pub opportunity_id: Option<String>,
    pub contact_id: Option<String>,
    pub interaction_type: InteractionType,
    pub interaction_date: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
    pub outcome: Option<String>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distributor_ids: Vec<String>,
}

impl Interaction {
    /// Outcome text when present and not blank.
    pub fn outcome_text(&self) -> Option<&str> {
        self.outcome
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Selects which principals a batch aggregation covers.
///
/// All criteria are optional and combine with AND. Listing order is by
/// principal name, then id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}
