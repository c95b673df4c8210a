use std::sync::Arc;

use crate::analytics::AnalyticsEngine;
use crate::config::Config;
use crate::provider::ProviderClient;
use crate::store::Store;
use crate::sync::{SyncDispatcher, SyncEngine};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// GitHub in production; tests inject a stub.
    pub provider: Arc<dyn ProviderClient>,
    /// Inline or background, chosen at startup via SYNC_INLINE.
    pub dispatcher: Arc<dyn SyncDispatcher>,
    pub config: Config,
}

impl AppState {
    pub fn sync_engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.store.clone(),
            Arc::clone(&self.provider),
            self.config.sync.clone(),
        )
    }

    pub fn analytics(&self) -> AnalyticsEngine {
        AnalyticsEngine::new(self.store.clone())
    }
}
