//! Async read contract over the CRM record store.
//!
//! The analytics layer depends only on `RecordStore`. `SqliteRecordStore`
//! runs every query on the blocking pool behind a non-poisoning mutex so no
//! async task ever blocks on SQLite.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::db::{
    Contact, DbError, DistributorRelationship, EngagementDb, Interaction, Organization,
    PrincipalFilter,
};

/// Read operations the engagement analytics need from a record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Organization by id, soft-deleted rows included.
    async fn get_organization(&self, id: &str) -> Result<Option<Organization>, DbError>;

    /// Live principals matching `filter`, ordered by name then id.
    async fn list_principals(&self, filter: &PrincipalFilter) -> Result<Vec<Organization>, DbError>;

    /// Active relationships of a principal, distributor name embedded.
    async fn active_relationships(
        &self,
        principal_id: &str,
    ) -> Result<Vec<DistributorRelationship>, DbError>;

    /// Interactions whose organization context is `organization_id`.
    async fn interactions_for_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Interaction>, DbError>;

    /// Interactions on opportunities listing `organization_id` as a participant.
    async fn interactions_for_participant(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Interaction>, DbError>;

    /// Contacts of an organization, departed ones included.
    async fn contacts_for_organization(&self, organization_id: &str) -> Result<Vec<Contact>, DbError>;
}

/// `RecordStore` backed by a local SQLite database.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Arc<Mutex<EngagementDb>>,
}

impl SqliteRecordStore {
    pub fn new(db: EngagementDb) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Ok(Self::new(EngagementDb::open_at(path)?))
    }

    /// Run a closure against the database for writes or ad-hoc queries.
    pub fn with_db<T>(&self, f: impl FnOnce(&EngagementDb) -> T) -> T {
        let guard = self.db.lock();
        f(&guard)
    }

    /// Run `f` on the blocking pool while holding the connection lock.
    async fn run<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&EngagementDb) -> Result<T, DbError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db.lock();
            f(&guard)
        })
        .await
        .map_err(|e| DbError::Task(e.to_string()))?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get_organization(&self, id: &str) -> Result<Option<Organization>, DbError> {
        let id = id.to_string();
        self.run(move |db| db.get_organization(&id)).await
    }

    async fn list_principals(&self, filter: &PrincipalFilter) -> Result<Vec<Organization>, DbError> {
        let filter = filter.clone();
        self.run(move |db| db.list_principals(&filter)).await
    }

    async fn active_relationships(
        &self,
        principal_id: &str,
    ) -> Result<Vec<DistributorRelationship>, DbError> {
        let id = principal_id.to_string();
        self.run(move |db| db.get_active_relationships(&id)).await
    }

    async fn interactions_for_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Interaction>, DbError> {
        let id = organization_id.to_string();
        self.run(move |db| db.get_interactions_for_organization(&id)).await
    }

    async fn interactions_for_participant(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Interaction>, DbError> {
        let id = organization_id.to_string();
        self.run(move |db| db.get_interactions_for_participant(&id)).await
    }

    async fn contacts_for_organization(&self, organization_id: &str) -> Result<Vec<Contact>, DbError> {
        let id = organization_id.to_string();
        self.run(move |db| db.get_contacts_for_organization(&id)).await
    }
}
