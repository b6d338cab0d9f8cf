use rusqlite::params;
use uuid::Uuid;

use super::*;

/// Shared SELECT for interactions. The last column folds the distributor
/// participants of the interaction's opportunity into a comma list.
const INTERACTION_SELECT: &str = "SELECT i.id, i.organization_id, i.opportunity_id, i.contact_id,
        i.interaction_type, i.interaction_date, i.duration_minutes, i.outcome,
        i.follow_up_required, i.follow_up_date, i.follow_up_completed_at,
        (SELECT GROUP_CONCAT(dp.organization_id)
           FROM opportunity_participants dp
          WHERE dp.opportunity_id = i.opportunity_id
            AND dp.role = 'distributor') AS distributor_ids
     FROM interactions i";

impl EngagementDb {
    // =========================================================================
    // Opportunities
    // =========================================================================

    pub fn upsert_opportunity(&self, opp: &Opportunity) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO opportunities (id, name, stage, estimated_value, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                stage = excluded.stage,
                estimated_value = excluded.estimated_value",
            params![opp.id, opp.name, opp.stage, opp.estimated_value, opp.created_at],
        )?;
        Ok(())
    }

    /// Link an organization to an opportunity. Re-linking replaces the role.
    pub fn add_opportunity_participant(
        &self,
        opportunity_id: &str,
        organization_id: &str,
        role: ParticipantRole,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO opportunity_participants (opportunity_id, organization_id, role)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(opportunity_id, organization_id) DO UPDATE SET role = excluded.role",
            params![opportunity_id, organization_id, role.as_str()],
        )?;
        Ok(())
    }

    // =========================================================================
    // Interactions
    // =========================================================================

    /// Insert or update an interaction. An empty `id` gets a fresh UUID.
    ///
    /// Returns the stored id. `distributor_ids` is derived data and ignored.
    pub fn upsert_interaction(&self, interaction: &Interaction) -> Result<String, DbError> {
        let id = if interaction.id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            interaction.id.clone()
        };
        self.conn.execute(
            "INSERT INTO interactions (
                id, organization_id, opportunity_id, contact_id, interaction_type,
                interaction_date, duration_minutes, outcome, follow_up_required,
                follow_up_date, follow_up_completed_at, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
                organization_id = excluded.organization_id,
                opportunity_id = excluded.opportunity_id,
                contact_id = excluded.contact_id,
                interaction_type = excluded.interaction_type,
                interaction_date = excluded.interaction_date,
                duration_minutes = excluded.duration_minutes,
                outcome = excluded.outcome,
                follow_up_required = excluded.follow_up_required,
                follow_up_date = excluded.follow_up_date,
                follow_up_completed_at = excluded.follow_up_completed_at",
            params![
                id,
                interaction.organization_id,
                interaction.opportunity_id,
                interaction.contact_id,
                interaction.interaction_type.as_str(),
                interaction.interaction_date,
                interaction.duration_minutes,
                interaction.outcome,
                interaction.follow_up_required as i32,
                interaction.follow_up_date,
                interaction.follow_up_completed_at,
            ],
        )?;
        Ok(id)
    }

    /// Live interactions logged directly against an organization, newest first.
    pub fn get_interactions_for_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Interaction>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "{INTERACTION_SELECT}
             WHERE i.organization_id = ?1 AND i.deleted_at IS NULL
             ORDER BY i.interaction_date DESC, i.id"
        ))?;
        let rows = stmt.query_map(params![organization_id], Self::map_interaction_row)?;
        collect_rows(rows)
    }

    /// Live interactions on any live opportunity the organization participates in.
    pub fn get_interactions_for_participant(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Interaction>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "{INTERACTION_SELECT}
             JOIN opportunity_participants op ON op.opportunity_id = i.opportunity_id
             JOIN opportunities o ON o.id = i.opportunity_id
             WHERE op.organization_id = ?1
               AND i.deleted_at IS NULL
               AND o.deleted_at IS NULL
             ORDER BY i.interaction_date DESC, i.id"
        ))?;
        let rows = stmt.query_map(params![organization_id], Self::map_interaction_row)?;
        collect_rows(rows)
    }

    fn map_interaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Interaction> {
        let distributors: Option<String> = row.get(11)?;
        Ok(Interaction {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            opportunity_id: row.get(2)?,
            contact_id: row.get(3)?,
            interaction_type: InteractionType::from_str_lossy(&row.get::<_, String>(4)?),
            interaction_date: row.get(5)?,
            duration_minutes: row.get(6)?,
            outcome: row.get(7)?,
            follow_up_required: row.get::<_, i32>(8)? != 0,
            follow_up_date: row.get(9)?,
            follow_up_completed_at: row.get(10)?,
            distributor_ids: distributors
                .map(|s| {
                    s.split(',')
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}
