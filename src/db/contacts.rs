use rusqlite::params;

use super::*;

impl EngagementDb {
    // =========================================================================
    // Contacts
    // =========================================================================

    /// Insert or update a contact.
    pub fn upsert_contact(&self, contact: &Contact) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO contacts (id, organization_id, name, email, is_primary, created_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                organization_id = excluded.organization_id,
                name = excluded.name,
                email = excluded.email,
                is_primary = excluded.is_primary,
                deleted_at = excluded.deleted_at",
            params![
                contact.id,
                contact.organization_id,
                contact.name,
                contact.email,
                contact.is_primary as i32,
                contact.created_at,
                contact.deleted_at,
            ],
        )?;
        Ok(())
    }

    /// All contacts for an organization, departed ones included.
    pub fn get_contacts_for_organization(&self, organization_id: &str) -> Result<Vec<Contact>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, organization_id, name, email, is_primary, created_at, deleted_at
             FROM contacts
             WHERE organization_id = ?1
             ORDER BY name, id",
        )?;
        let rows = stmt.query_map(params![organization_id], |row| {
            Ok(Contact {
                id: row.get(0)?,
                organization_id: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                is_primary: row.get::<_, i32>(4)? != 0,
                created_at: row.get(5)?,
                deleted_at: row.get(6)?,
            })
        })?;
        collect_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::db::test_utils::test_db;

    #[test]
    fn test_contacts_include_departed() {
        let db = test_db();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        db.upsert_contact(&Contact {
            id: "c-1".into(),
            organization_id: "p-1".into(),
            name: "Dana Ruiz".into(),
            email: Some("dana@acme.test".into()),
            is_primary: true,
            created_at: at,
            deleted_at: Some(at),
        })
        .unwrap();
        db.upsert_contact(&Contact {
            id: "c-2".into(),
            organization_id: "p-1".into(),
            name: "Ari Lee".into(),
            email: None,
            is_primary: false,
            created_at: at,
            deleted_at: None,
        })
        .unwrap();

        let contacts = db.get_contacts_for_organization("p-1").unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Ari Lee");
        assert!(contacts[1].is_primary);
        assert_eq!(contacts[1].deleted_at, Some(at));
    }
}
