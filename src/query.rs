// src/query.rs

//! Query resolver: the public, never-failing face of the engine.
//!
//! Every operation fills missing parameters from `[defaults]` and
//! degrades to an empty list or `None` instead of returning an error.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    Config, CourseRecord, CourseSummary, CourseView, Department, QueryDefaults, Term,
};
use crate::pipeline::Synchronizer;
use crate::services::{CourseSource, UpstreamSource};
use crate::storage::{CatalogStore, LocalStorage};

/// Department and term selection; unset fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermQuery {
    pub dept: Option<String>,
    pub degree: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
}

impl TermQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dept(mut self, dept: impl Into<String>) -> Self {
        self.dept = Some(dept.into());
        self
    }

    pub fn degree(mut self, degree: impl Into<String>) -> Self {
        self.degree = Some(degree.into());
        self
    }

    pub fn term(mut self, year: impl Into<String>, semester: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self.semester = Some(semester.into());
        self
    }

    /// Fill every unset field from `defaults`.
    pub fn resolve(&self, defaults: &QueryDefaults) -> ResolvedQuery {
        let pick = |value: &Option<String>, fallback: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        ResolvedQuery {
            dept: pick(&self.dept, &defaults.dept),
            degree: pick(&self.degree, &defaults.degree),
            term: Term::new(
                pick(&self.year, &defaults.year),
                pick(&self.semester, &defaults.semester),
            ),
        }
    }
}

/// A `TermQuery` with every field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub dept: String,
    pub degree: String,
    pub term: Term,
}

/// Entry point for callers such as an API layer or the CLI.
pub struct Catalog {
    sync: Synchronizer,
    defaults: QueryDefaults,
}

impl Catalog {
    pub fn new(
        source: Arc<dyn CourseSource>,
        store: Arc<dyn CatalogStore>,
        config: &Config,
    ) -> Self {
        Self {
            sync: Synchronizer::new(source, store, config.sync.clone(), config.cache.clone()),
            defaults: config.defaults.clone(),
        }
    }

    /// Wire the live upstream and the on-disk store described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = UpstreamSource::new(&config.upstream)?;
        let store = LocalStorage::new(&config.storage.dir);
        Ok(Self::new(Arc::new(source), Arc::new(store), config))
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    /// Every cached course with its offering history.
    pub async fn all_courses(&self) -> Vec<CourseRecord> {
        match self.sync.store().all_courses().await {
            Ok(courses) => courses,
            Err(e) => {
                log::error!("Failed to read courses: {}", e);
                Vec::new()
            }
        }
    }

    /// Courses of one department offered in one term.
    pub async fn courses_by_department(&self, query: &TermQuery) -> Vec<CourseSummary> {
        let q = query.resolve(&self.defaults);
        match self.sync.department_courses(&q.dept, &q.degree, &q.term).await {
            Ok(courses) => courses,
            Err(e) => {
                log::error!("Department sync failed for {} {}: {}", q.dept, q.term, e);
                Vec::new()
            }
        }
    }

    /// Detail view of one course; `None` when it cannot be produced.
    pub async fn course_detail(&self, id: &str, query: &TermQuery) -> Option<CourseView> {
        let q = query.resolve(&self.defaults);
        match self.sync.course_detail(id, &q.dept, &q.degree, &q.term).await {
            Ok(view) => view,
            Err(e) => {
                log::error!("Course detail failed for {} {}: {}", id, q.term, e);
                None
            }
        }
    }

    pub async fn departments(&self) -> Vec<Department> {
        match self.sync.departments().await {
            Ok(departments) => departments,
            Err(e) => {
                log::error!("Department directory failed: {}", e);
                Vec::new()
            }
        }
    }
}
