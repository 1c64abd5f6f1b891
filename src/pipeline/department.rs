// src/pipeline/department.rs

//! Department course-list synchronization.

use chrono::Utc;
use futures::future::join_all;

use crate::error::Result;
use crate::models::{CourseRecord, CourseRow, CourseSummary, Term};
use crate::pipeline::Synchronizer;
use crate::pipeline::merge::{backfill_window, merge_terms, project_term};

impl Synchronizer {
    /// Courses of `dept` offered in `term`.
    ///
    /// Served from cache once any course of the department has history;
    /// otherwise a full multi-term backfill runs first.
    pub async fn department_courses(
        &self,
        dept: &str,
        degree: &str,
        term: &Term,
    ) -> Result<Vec<CourseSummary>> {
        let existing = self.store.courses_in_department(dept).await?;
        if existing.iter().any(CourseRecord::has_history) {
            log::debug!("Department {} served from cache for {}", dept, term);
            return Ok(project_term(&existing, term));
        }

        let _guard = self.department_flights.acquire(dept.to_string()).await;

        // Another caller may have finished the backfill while we waited.
        let existing = self.store.courses_in_department(dept).await?;
        if existing.iter().any(CourseRecord::has_history) {
            return Ok(project_term(&existing, term));
        }

        let records = self.backfill(dept, degree, term, existing).await?;
        Ok(project_term(&records, term))
    }

    /// Scrape every term of the window concurrently and persist the merge.
    async fn backfill(
        &self,
        dept: &str,
        degree: &str,
        term: &Term,
        existing: Vec<CourseRecord>,
    ) -> Result<Vec<CourseRecord>> {
        let window = backfill_window(&term.year, &self.sync, Utc::now());
        log::info!(
            "Department {} has no cached history, scraping {} terms from {}",
            dept,
            window.len(),
            term.year
        );

        let scraped = join_all(window.into_iter().map(|t| async move {
            let rows = self.scrape_term(dept, degree, &t).await;
            (t, rows)
        }))
        .await;

        let records = merge_terms(existing, &scraped, Utc::now());
        if !records.is_empty() {
            self.store.upsert_courses(&records).await?;
        }
        log::info!("Department {} backfill stored {} courses", dept, records.len());
        Ok(records)
    }

    /// One term of a backfill; failures count as an empty list.
    async fn scrape_term(&self, dept: &str, degree: &str, term: &Term) -> Vec<CourseRow> {
        match self.source.course_list(dept, degree, term).await {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!(
                    "Failed to scrape {} for year {} semester {}: {}",
                    dept,
                    term.year,
                    term.semester,
                    e
                );
                Vec::new()
            }
        }
    }
}
