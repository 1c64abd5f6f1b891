//! Time-to-live wrapper for cached entities.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A cached value with the moment it was fetched and how long it stays fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cached<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
    /// `None` never expires
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl<T> Cached<T> {
    /// Wrap a value fetched just now.
    pub fn new(value: T, ttl: Option<Duration>) -> Self {
        Self::fetched_at(value, Utc::now(), ttl)
    }

    pub fn fetched_at(value: T, fetched_at: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            fetched_at,
            ttl_secs: ttl.map(|d| d.as_secs()),
        }
    }

    /// When the value goes stale, if ever.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.ttl_secs?).ok()?;
        self.fetched_at
            .checked_add_signed(TimeDelta::try_seconds(secs)?)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.ttl_secs {
            None => true,
            Some(_) => self.expires_at().is_none_or(|at| now <= at),
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Convert an hour count from config into a TTL.
pub fn hours(h: u64) -> Duration {
    Duration::from_secs(h.saturating_mul(3600))
}
