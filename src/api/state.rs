use std::sync::Arc;

use crate::db::{Cache, MemoryStore, Repository};
use crate::services::RecommendationEngine;

/// Shared application state
///
/// The store handle is created once at startup and shared by reference;
/// handlers never own or close it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Repository>,
    pub cache: Option<Cache>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

impl AppState {
    /// Creates state over the given store, without a cache
    pub fn new(store: Arc<dyn Repository>) -> Self {
        Self { store, cache: None }
    }

    /// Enables the Redis catalogue cache
    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Recommendation engine reading from this state's store
    pub fn engine(&self) -> RecommendationEngine<'_, dyn Repository> {
        RecommendationEngine::new(self.store.as_ref())
    }
}
