//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Term;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream endpoint and HTTP client settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Backfill window settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Cache freshness settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Defaults applied to queries that omit parameters
    #[serde(default)]
    pub defaults: QueryDefaults,

    /// On-disk store location
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.upstream.user_agent.trim().is_empty() {
            return Err(AppError::validation("upstream.user_agent is empty"));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(AppError::validation("upstream.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.upstream.endpoint)?;
        if self.sync.history_years == 0 {
            return Err(AppError::validation("sync.history_years must be > 0"));
        }
        if self.sync.semesters.is_empty() {
            return Err(AppError::validation("sync.semesters is empty"));
        }
        if self.cache.department_ttl_hours == 0 {
            return Err(AppError::validation(
                "cache.department_ttl_hours must be > 0",
            ));
        }
        let d = &self.defaults;
        if [&d.dept, &d.degree, &d.year, &d.semester]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(AppError::validation(
                "defaults.dept, degree, year and semester must all be set",
            ));
        }
        Ok(())
    }
}

/// Upstream form endpoint and HTTP behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// The single form endpoint every step is posted to
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// `lang` form field
    #[serde(default = "defaults::lang")]
    pub lang: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            lang: defaults::lang(),
        }
    }
}

/// Which terms a department backfill covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Requested year plus this many minus one preceding years
    #[serde(default = "defaults::history_years")]
    pub history_years: u32,

    /// Semester codes scraped for every year
    #[serde(default = "defaults::semesters")]
    pub semesters: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            history_years: defaults::history_years(),
            semesters: defaults::semesters(),
        }
    }
}

/// Freshness windows for cached entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "defaults::department_ttl_hours")]
    pub department_ttl_hours: u64,

    /// Unset means detail documents never expire
    #[serde(default)]
    pub detail_ttl_hours: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            department_ttl_hours: defaults::department_ttl_hours(),
            detail_ttl_hours: None,
        }
    }
}

/// Parameters assumed when a query leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDefaults {
    #[serde(default = "defaults::dept")]
    pub dept: String,
    #[serde(default = "defaults::degree")]
    pub degree: String,
    #[serde(default = "defaults::year")]
    pub year: String,
    #[serde(default = "defaults::semester")]
    pub semester: String,
}

impl QueryDefaults {
    pub fn term(&self) -> Term {
        Term::new(&self.year, &self.semester)
    }
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            dept: defaults::dept(),
            degree: defaults::degree(),
            year: defaults::year(),
            semester: defaults::semester(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::storage_dir")]
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
        }
    }
}

mod defaults {
    // Upstream defaults
    pub fn endpoint() -> String {
        "https://bgu4u.bgu.ac.il/pls/scwp/!app.ann".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn lang() -> String {
        "he".into()
    }

    // Sync defaults
    pub fn history_years() -> u32 {
        4
    }
    pub fn semesters() -> Vec<String> {
        vec!["1".into(), "2".into(), "3".into()]
    }

    // Cache defaults
    pub fn department_ttl_hours() -> u64 {
        24
    }

    // Query defaults
    pub fn dept() -> String {
        "202".into()
    }
    pub fn degree() -> String {
        "1".into()
    }
    pub fn year() -> String {
        "2026".into()
    }
    pub fn semester() -> String {
        "2".into()
    }

    pub fn storage_dir() -> String {
        "storage".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.upstream.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.upstream.endpoint = "not a url".to_string();
        assert!(matches!(config.validate(), Err(AppError::Url(_))));
    }

    #[test]
    fn validate_rejects_empty_semesters() {
        let mut config = Config::default();
        config.sync.semesters.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            history_years = 2

            [cache]
            detail_ttl_hours = 72
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.history_years, 2);
        assert_eq!(config.sync.semesters, ["1", "2", "3"]);
        assert_eq!(config.cache.department_ttl_hours, 24);
        assert_eq!(config.cache.detail_ttl_hours, Some(72));
        assert_eq!(config.defaults.term(), Term::new("2026", "2"));
    }
}
