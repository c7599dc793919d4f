//! Role queries: paged listing and the id/name lookup used by pickers.

use std::sync::Arc;

use crate::claim::ClaimTypeCatalog;
use crate::listing::{self, ListQuery, Page};
use crate::role::entity::{RoleLookupEntry, RoleSortField, RoleSummary};
use crate::shared::context::IdentityContext;
use crate::shared::error::Result;
use crate::store::PrincipalStore;

pub struct ListRolesUseCase {
    store: Arc<dyn PrincipalStore>,
    catalog: Arc<ClaimTypeCatalog>,
}

impl ListRolesUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self {
            store: ctx.store.clone(),
            catalog: ctx.catalog.clone(),
        }
    }

    pub async fn execute(&self, query: &ListQuery<RoleSortField>) -> Result<Page<RoleSummary>> {
        let summaries: Vec<RoleSummary> = self
            .store
            .query_roles()
            .await?
            .into_iter()
            .map(|record| RoleSummary::from_record(record, &self.catalog))
            .collect();
        listing::list(summaries, query)
    }
}

pub struct RoleLookupUseCase {
    store: Arc<dyn PrincipalStore>,
}

impl RoleLookupUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self { store: ctx.store.clone() }
    }

    /// All roles ordered by name.
    pub async fn execute(&self) -> Result<Vec<RoleLookupEntry>> {
        let mut entries: Vec<RoleLookupEntry> = self
            .store
            .query_roles()
            .await?
            .into_iter()
            .map(|record| RoleLookupEntry {
                id: record.role.id,
                name: record.role.name,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }
}
