//! List Users Query

use std::sync::Arc;

use chrono::Utc;

use crate::claim::ClaimTypeCatalog;
use crate::listing::{self, ListQuery, Page};
use crate::shared::context::IdentityContext;
use crate::shared::error::Result;
use crate::store::PrincipalStore;
use crate::user::entity::{UserSortField, UserSummary};

pub struct ListUsersUseCase {
    store: Arc<dyn PrincipalStore>,
    catalog: Arc<ClaimTypeCatalog>,
}

impl ListUsersUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self {
            store: ctx.store.clone(),
            catalog: ctx.catalog.clone(),
        }
    }

    pub async fn execute(&self, query: &ListQuery<UserSortField>) -> Result<Page<UserSummary>> {
        let now = Utc::now();
        let summaries: Vec<UserSummary> = self
            .store
            .query_users()
            .await?
            .into_iter()
            .map(|record| UserSummary::from_record(record, &self.catalog, now))
            .collect();
        listing::list(summaries, query)
    }
}
