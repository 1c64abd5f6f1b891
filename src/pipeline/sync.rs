// src/pipeline/sync.rs

//! The synchronizer shared by all cache-aside operations.

use std::sync::Arc;
use std::time::Duration;

use crate::models::{CacheConfig, SyncConfig, Term};
use crate::pipeline::InFlight;
use crate::services::CourseSource;
use crate::storage::{CatalogStore, cache};

/// Department of a sync. Matches the scope of the history check, so any
/// two backfills of one department are serialized.
pub(crate) type DepartmentKey = String;

/// (full course id, term) of a detail scrape.
pub(crate) type DetailKey = (String, Term);

/// Decides between cache and upstream and keeps the store consistent.
pub struct Synchronizer {
    pub(crate) source: Arc<dyn CourseSource>,
    pub(crate) store: Arc<dyn CatalogStore>,
    pub(crate) sync: SyncConfig,
    pub(crate) cache: CacheConfig,
    pub(crate) department_flights: InFlight<DepartmentKey>,
    pub(crate) detail_flights: InFlight<DetailKey>,
    pub(crate) directory_flight: InFlight<()>,
}

impl Synchronizer {
    pub fn new(
        source: Arc<dyn CourseSource>,
        store: Arc<dyn CatalogStore>,
        sync: SyncConfig,
        cache: CacheConfig,
    ) -> Self {
        Self {
            source,
            store,
            sync,
            cache,
            department_flights: InFlight::new(),
            detail_flights: InFlight::new(),
            directory_flight: InFlight::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub(crate) fn department_ttl(&self) -> Duration {
        cache::hours(self.cache.department_ttl_hours)
    }

    pub(crate) fn detail_ttl(&self) -> Option<Duration> {
        self.cache.detail_ttl_hours.map(cache::hours)
    }
}
