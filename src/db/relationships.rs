use rusqlite::params;

use super::*;

impl EngagementDb {
    // =========================================================================
    // Principal / distributor relationships
    // =========================================================================

    /// Insert or update a relationship. The (principal, distributor) pair is unique.
    pub fn upsert_relationship(&self, rel: &DistributorRelationship) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO distributor_relationships (
                id, principal_id, distributor_id, is_active, territory,
                contract_start, contract_end, annual_volume_commitment, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(principal_id, distributor_id) DO UPDATE SET
                is_active = excluded.is_active,
                territory = excluded.territory,
                contract_start = excluded.contract_start,
                contract_end = excluded.contract_end,
                annual_volume_commitment = excluded.annual_volume_commitment",
            params![
                rel.id,
                rel.principal_id,
                rel.distributor_id,
                rel.is_active as i32,
                rel.territory,
                rel.contract_start,
                rel.contract_end,
                rel.annual_volume_commitment,
                rel.created_at,
            ],
        )?;
        Ok(())
    }

    /// Active relationships for a principal with the distributor name embedded.
    ///
    /// Relationships whose distributor organization was soft-deleted are dropped.
    pub fn get_active_relationships(
        &self,
        principal_id: &str,
    ) -> Result<Vec<DistributorRelationship>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.principal_id, r.distributor_id, d.name, r.is_active,
                    r.territory, r.contract_start, r.contract_end,
                    r.annual_volume_commitment, r.created_at
             FROM distributor_relationships r
             JOIN organizations d ON d.id = r.distributor_id
             WHERE r.principal_id = ?1
               AND r.is_active = 1
               AND d.deleted_at IS NULL
             ORDER BY d.name, r.distributor_id",
        )?;
        let rows = stmt.query_map(params![principal_id], Self::map_relationship_row)?;
        collect_rows(rows)
    }

    fn map_relationship_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DistributorRelationship> {
        Ok(DistributorRelationship {
            id: row.get(0)?,
            principal_id: row.get(1)?,
            distributor_id: row.get(2)?,
            distributor_name: row.get(3)?,
            is_active: row.get::<_, i32>(4)? != 0,
            territory: row.get(5)?,
            contract_start: row.get(6)?,
            contract_end: row.get(7)?,
            annual_volume_commitment: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::db::test_utils::{org, test_db};

    fn rel(id: &str, distributor: &str, active: bool) -> DistributorRelationship {
        DistributorRelationship {
            id: id.to_string(),
            principal_id: "p-1".to_string(),
            distributor_id: distributor.to_string(),
            distributor_name: String::new(),
            is_active: active,
            territory: Some("Midwest".to_string()),
            contract_start: NaiveDate::from_ymd_opt(2024, 1, 1),
            contract_end: NaiveDate::from_ymd_opt(2025, 12, 31),
            annual_volume_commitment: Some(120_000.0),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_active_relationships_embed_distributor_name() {
        let db = test_db();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        db.upsert_organization(&org("p-1", "Acme", OrganizationType::Principal, at)).unwrap();
        db.upsert_organization(&org("d-1", "Metro Supply", OrganizationType::Distributor, at))
            .unwrap();
        db.upsert_organization(&org("d-2", "Coastal Foods", OrganizationType::Distributor, at))
            .unwrap();
        db.upsert_relationship(&rel("r-1", "d-1", true)).unwrap();
        db.upsert_relationship(&rel("r-2", "d-2", false)).unwrap();

        let active = db.get_active_relationships("p-1").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].distributor_name, "Metro Supply");
        assert_eq!(active[0].contract_end, NaiveDate::from_ymd_opt(2025, 12, 31));
        assert_eq!(active[0].annual_volume_commitment, Some(120_000.0));
    }

    #[test]
    fn test_upsert_relationship_updates_existing_pair() {
        let db = test_db();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        db.upsert_organization(&org("d-1", "Metro Supply", OrganizationType::Distributor, at))
            .unwrap();
        db.upsert_relationship(&rel("r-1", "d-1", true)).unwrap();
        let mut changed = rel("r-other", "d-1", true);
        changed.territory = Some("Southeast".to_string());
        db.upsert_relationship(&changed).unwrap();

        let active = db.get_active_relationships("p-1").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "r-1");
        assert_eq!(active[0].territory.as_deref(), Some("Southeast"));
    }
}
