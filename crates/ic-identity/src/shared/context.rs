//! Everything the use cases need, built once at startup.

use std::sync::Arc;

use ic_config::{AppConfig, ListingConfig};

use crate::claim::ClaimTypeCatalog;
use crate::reconcile::{ApplyPolicy, Reconciler};
use crate::shared::principal_lock::PrincipalLocks;
use crate::store::PrincipalStore;

#[derive(Clone)]
pub struct IdentityContext {
    pub store: Arc<dyn PrincipalStore>,
    pub catalog: Arc<ClaimTypeCatalog>,
    pub reconciler: Arc<Reconciler>,
    pub listing: ListingConfig,
}

impl IdentityContext {
    pub fn new(store: Arc<dyn PrincipalStore>, catalog: ClaimTypeCatalog, config: &AppConfig) -> Self {
        let locks = Arc::new(PrincipalLocks::new(config.reconcile.serialize_per_principal));
        let reconciler = Reconciler::new(store.clone(), locks, ApplyPolicy::from(&config.reconcile));
        Self {
            store,
            catalog: Arc::new(catalog),
            reconciler: Arc::new(reconciler),
            listing: config.listing.clone(),
        }
    }
}
