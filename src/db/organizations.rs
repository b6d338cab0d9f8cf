use rusqlite::params;
use rusqlite::types::Value;

use super::*;

const ORGANIZATION_COLUMNS: &str = "id, name, organization_type, created_at, deleted_at";

impl EngagementDb {
    // =========================================================================
    // Organizations
    // =========================================================================

    /// Insert or update an organization.
    pub fn upsert_organization(&self, org: &Organization) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO organizations (id, name, organization_type, created_at, updated_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                organization_type = excluded.organization_type,
                deleted_at = excluded.deleted_at,
                updated_at = datetime('now')",
            params![
                org.id,
                org.name,
                org.organization_type.as_str(),
                org.created_at,
                org.deleted_at,
            ],
        )?;
        Ok(())
    }

    /// Get an organization by ID, including soft-deleted rows.
    pub fn get_organization(&self, id: &str) -> Result<Option<Organization>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_organization_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List live principal organizations matching `filter`, ordered by name.
    pub fn list_principals(&self, filter: &PrincipalFilter) -> Result<Vec<Organization>, DbError> {
        let mut sql = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations
             WHERE organization_type = 'principal' AND deleted_at IS NULL"
        );
        let mut values: Vec<Value> = Vec::new();

        if let Some(ids) = filter.ids.as_ref().filter(|ids| !ids.is_empty()) {
            let placeholders: Vec<String> = ids
                .iter()
                .map(|id| {
                    values.push(Value::Text(id.clone()));
                    format!("?{}", values.len())
                })
                .collect();
            sql.push_str(&format!(" AND id IN ({})", placeholders.join(", ")));
        }

        if let Some(fragment) = filter.name_contains.as_deref() {
            let fragment = escape_like(&fragment.trim().to_lowercase());
            values.push(Value::Text(format!("%{}%", fragment)));
            sql.push_str(&format!(" AND LOWER(name) LIKE ?{} ESCAPE '\\'", values.len()));
        }

        sql.push_str(" ORDER BY name, id");

        if let Some(limit) = filter.limit {
            values.push(Value::Integer(limit as i64));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), Self::map_organization_row)?;
        collect_rows(rows)
    }

    pub(crate) fn map_organization_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Organization> {
        Ok(Organization {
            id: row.get(0)?,
            name: row.get(1)?,
            organization_type: OrganizationType::from_str_lossy(&row.get::<_, String>(2)?),
            created_at: row.get(3)?,
            deleted_at: row.get(4)?,
        })
    }
}

/// Backslash-escape `LIKE` wildcards so a name fragment matches literally.
fn escape_like(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::db::test_utils::{org, test_db};

    fn seed(db: &EngagementDb) {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        db.upsert_organization(&org("p-2", "Zest Foods", OrganizationType::Principal, at))
            .unwrap();
        db.upsert_organization(&org("p-1", "Acme Sauces", OrganizationType::Principal, at))
            .unwrap();
        db.upsert_organization(&org("d-1", "Metro Supply", OrganizationType::Distributor, at))
            .unwrap();
        let mut gone = org("p-3", "Acme Legacy", OrganizationType::Principal, at);
        gone.deleted_at = Some(at);
        db.upsert_organization(&gone).unwrap();
    }

    #[test]
    fn test_get_organization_round_trips_type_and_dates() {
        let db = test_db();
        seed(&db);
        let found = db.get_organization("d-1").unwrap().expect("exists");
        assert_eq!(found.organization_type, OrganizationType::Distributor);
        assert_eq!(found.created_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(db.get_organization("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_principals_skips_deleted_and_other_roles() {
        let db = test_db();
        seed(&db);
        let principals = db.list_principals(&PrincipalFilter::default()).unwrap();
        let ids: Vec<&str> = principals.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p-1", "p-2"]);
    }

    #[test]
    fn test_list_principals_applies_filters() {
        let db = test_db();
        seed(&db);

        let by_name = db
            .list_principals(&PrincipalFilter {
                name_contains: Some("ACME".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "p-1");

        let by_ids = db
            .list_principals(&PrincipalFilter {
                ids: Some(vec!["p-2".into(), "d-1".into()]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_ids.len(), 1);
        assert_eq!(by_ids[0].id, "p-2");

        let limited = db
            .list_principals(&PrincipalFilter {
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_name_filter_treats_wildcards_literally() {
        let db = test_db();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for (id, name) in [("p-1", "50% Juice"), ("p-2", "500 Brands"), ("p-3", "Cold_Press Co")] {
            db.upsert_organization(&org(id, name, OrganizationType::Principal, at))
                .unwrap();
        }
        db.upsert_organization(&org("p-4", "ColdXPress", OrganizationType::Principal, at))
            .unwrap();

        let names = |fragment: &str| -> Vec<String> {
            db.list_principals(&PrincipalFilter {
                name_contains: Some(fragment.into()),
                ..Default::default()
            })
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect()
        };
        assert_eq!(names("50%"), vec!["50% Juice".to_string()]);
        assert_eq!(names("d_p"), vec!["Cold_Press Co".to_string()]);
        assert_eq!(names("50"), vec!["50% Juice".to_string(), "500 Brands".to_string()]);
    }
}
