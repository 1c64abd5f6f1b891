//! Storage abstractions for the catalog cache.
//!
//! Three entity sets are persisted:
//! - Course records keyed by course id, each owning its offering history
//! - Detail documents keyed by (course id, year, semester)
//! - The department directory with one staleness timestamp
//!
//! ## Directory Structure (`LocalStorage`)
//!
//! ```text
//! storage/
//! ├── courses.json          # id -> CourseRecord
//! ├── details.json          # "id@year-semester" -> Cached<CourseDetail>
//! └── departments.json      # Cached<Vec<Department>>
//! ```

pub mod cache;
pub mod local;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CourseDetail, CourseRecord, Department, Term};

// Re-export for convenience
pub use cache::Cached;
pub use local::LocalStorage;
pub use memory::MemoryStore;

/// Key of a detail document.
pub fn detail_key(id: &str, term: &Term) -> String {
    format!("{}@{}-{}", id, term.year, term.semester)
}

/// Trait for catalog storage backends.
///
/// Upserts are idempotent: writing the same record twice leaves one copy.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every course record.
    async fn all_courses(&self) -> Result<Vec<CourseRecord>>;

    /// Course records whose id starts with `{dept}.`.
    async fn courses_in_department(&self, dept: &str) -> Result<Vec<CourseRecord>>;

    /// First record matching any of `ids`, tried in order.
    async fn find_course(&self, ids: &[&str]) -> Result<Option<CourseRecord>>;

    /// Insert records by id, unioning offerings with a stored copy.
    async fn upsert_courses(&self, records: &[CourseRecord]) -> Result<()>;

    async fn find_detail(&self, id: &str, term: &Term) -> Result<Option<Cached<CourseDetail>>>;

    /// Insert or replace a detail document by (id, year, semester).
    async fn upsert_detail(&self, detail: Cached<CourseDetail>) -> Result<()>;

    async fn all_details(&self) -> Result<Vec<CourseDetail>>;

    /// Detail documents with a related-course edge to any of `ids`.
    async fn details_referencing(&self, ids: &[&str]) -> Result<Vec<CourseDetail>> {
        Ok(self
            .all_details()
            .await?
            .into_iter()
            .filter(|d| d.edges_to(ids).next().is_some())
            .collect())
    }

    async fn load_departments(&self) -> Result<Option<Cached<Vec<Department>>>>;

    /// Replace the whole directory and its timestamp.
    async fn replace_departments(&self, directory: Cached<Vec<Department>>) -> Result<()>;
}

/// Upsert `records` into `courses`, unioning offerings with any stored copy.
pub(crate) fn merge_courses(
    courses: &mut BTreeMap<String, CourseRecord>,
    records: &[CourseRecord],
) {
    for record in records {
        match courses.get_mut(&record.id) {
            Some(stored) => stored.merge(record.clone()),
            None => {
                courses.insert(record.id.clone(), record.clone());
            }
        }
    }
}

pub(crate) fn in_department(record: &CourseRecord, dept: &str) -> bool {
    record
        .id
        .strip_prefix(dept)
        .is_some_and(|rest| rest.starts_with('.'))
}
