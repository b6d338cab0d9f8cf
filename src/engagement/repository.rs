//! Loads everything one principal's analytics need from the record store.

use std::collections::HashSet;
use std::sync::Arc;

use crate::db::{Contact, DistributorRelationship, Interaction, Organization, OrganizationType, PrincipalFilter};
use crate::error::EngagementError;
use crate::store::RecordStore;

/// A principal and the records attributable to it.
#[derive(Debug, Clone)]
pub struct PrincipalContext {
    pub principal: Organization,
    pub relationships: Vec<DistributorRelationship>,
    pub contacts: Vec<Contact>,
    /// Deduplicated by id, newest first, ties by id.
    pub interactions: Vec<Interaction>,
}

#[derive(Clone)]
pub struct RelationshipRepository {
    store: Arc<dyn RecordStore>,
}

impl RelationshipRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list_principals(
        &self,
        filter: &PrincipalFilter,
    ) -> Result<Vec<Organization>, EngagementError> {
        Ok(self.store.list_principals(filter).await?)
    }

    /// Load a live principal with its active relationships, contacts and
    /// interactions. Any store failure aborts the load.
    pub async fn load_principal_context(
        &self,
        principal_id: &str,
    ) -> Result<PrincipalContext, EngagementError> {
        let principal = match self.store.get_organization(principal_id).await? {
            Some(org)
                if org.deleted_at.is_none()
                    && org.organization_type == OrganizationType::Principal =>
            {
                org
            }
            _ => {
                return Err(EngagementError::NotFound {
                    principal_id: principal_id.to_string(),
                })
            }
        };

        let relationships = self.store.active_relationships(principal_id).await?;
        let contacts = self.store.contacts_for_organization(principal_id).await?;
        let direct = self.store.interactions_for_organization(principal_id).await?;
        let via_opportunities = self.store.interactions_for_participant(principal_id).await?;

        Ok(PrincipalContext {
            principal,
            relationships,
            contacts,
            interactions: merge_interactions(direct, via_opportunities),
        })
    }
}

/// Union of both lists keyed by id, first occurrence wins.
pub fn merge_interactions(direct: Vec<Interaction>, related: Vec<Interaction>) -> Vec<Interaction> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Interaction> = direct
        .into_iter()
        .chain(related)
        .filter(|i| seen.insert(i.id.clone()))
        .collect();
    merged.sort_by(|a, b| {
        b.interaction_date
            .cmp(&a.interaction_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    merged
}
