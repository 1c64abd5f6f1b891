// src/pipeline/directory.rs

//! Department directory refresh.

use chrono::Utc;

use crate::error::Result;
use crate::models::Department;
use crate::pipeline::Synchronizer;
use crate::storage::Cached;

impl Synchronizer {
    /// The department directory, refreshed wholesale once stale.
    ///
    /// A failed or empty refresh keeps serving whatever is cached.
    pub async fn departments(&self) -> Result<Vec<Department>> {
        let cached = self.store.load_departments().await?;
        if let Some(directory) = cached.as_ref().filter(|d| d.is_fresh(Utc::now())) {
            return Ok(directory.value.clone());
        }

        let _guard = self.directory_flight.acquire(()).await;
        let cached = self.store.load_departments().await?;
        if let Some(directory) = cached.as_ref().filter(|d| d.is_fresh(Utc::now())) {
            return Ok(directory.value.clone());
        }

        log::info!("Fetching fresh department directory");
        let fresh = match self.source.departments().await {
            Ok(fresh) => fresh,
            Err(e) => {
                log::error!("Department directory refresh failed: {}", e);
                return Ok(cached.map(Cached::into_value).unwrap_or_default());
            }
        };

        if fresh.is_empty() {
            if let Some(previous) = cached.filter(|d| !d.value.is_empty()) {
                log::warn!(
                    "Upstream returned no departments, keeping {} cached entries",
                    previous.value.len()
                );
                return Ok(previous.into_value());
            }
        }

        self.store
            .replace_departments(Cached::new(fresh.clone(), Some(self.department_ttl())))
            .await?;
        log::info!("Department directory refreshed with {} entries", fresh.len());
        Ok(fresh)
    }
}
