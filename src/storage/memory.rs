//! In-process storage backend.
//!
//! Holds everything in memory; useful for tests and for embedding the
//! engine where persistence is handled elsewhere.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CourseDetail, CourseRecord, Department, Term};
use crate::storage::{CatalogStore, Cached, detail_key, in_department, merge_courses};

#[derive(Debug, Default)]
struct State {
    courses: BTreeMap<String, CourseRecord>,
    details: BTreeMap<String, Cached<CourseDetail>>,
    departments: Option<Cached<Vec<Department>>>,
}

/// Memory-backed [`CatalogStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored course records.
    pub fn course_count(&self) -> usize {
        self.read().courses.len()
    }

    /// Number of stored detail documents.
    pub fn detail_count(&self) -> usize {
        self.read().details.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn all_courses(&self) -> Result<Vec<CourseRecord>> {
        Ok(self.read().courses.values().cloned().collect())
    }

    async fn courses_in_department(&self, dept: &str) -> Result<Vec<CourseRecord>> {
        Ok(self
            .read()
            .courses
            .values()
            .filter(|r| in_department(r, dept))
            .cloned()
            .collect())
    }

    async fn find_course(&self, ids: &[&str]) -> Result<Option<CourseRecord>> {
        let state = self.read();
        Ok(ids.iter().find_map(|id| state.courses.get(*id).cloned()))
    }

    async fn upsert_courses(&self, records: &[CourseRecord]) -> Result<()> {
        merge_courses(&mut self.write().courses, records);
        Ok(())
    }

    async fn find_detail(&self, id: &str, term: &Term) -> Result<Option<Cached<CourseDetail>>> {
        Ok(self.read().details.get(&detail_key(id, term)).cloned())
    }

    async fn upsert_detail(&self, detail: Cached<CourseDetail>) -> Result<()> {
        let key = detail_key(&detail.value.id, &detail.value.term());
        self.write().details.insert(key, detail);
        Ok(())
    }

    async fn all_details(&self) -> Result<Vec<CourseDetail>> {
        Ok(self
            .read()
            .details
            .values()
            .map(|c| c.value.clone())
            .collect())
    }

    async fn load_departments(&self) -> Result<Option<Cached<Vec<Department>>>> {
        Ok(self.read().departments.clone())
    }

    async fn replace_departments(&self, directory: Cached<Vec<Department>>) -> Result<()> {
        self.write().departments = Some(directory);
        Ok(())
    }
}
