// src/pipeline/detail.rs

//! Course detail synchronization with term fallback and reverse edges.

use std::collections::HashSet;

use chrono::Utc;

use crate::error::Result;
use crate::models::{BlockedCourse, CourseDetail, CourseKey, CourseView, Offering, Term};
use crate::pipeline::Synchronizer;
use crate::storage::Cached;

/// Pick the term to serve when `requested` was never offered.
///
/// Hops to the newest known offering; the visited set stops any cycle.
pub fn route_term(offerings: &[Offering], requested: &Term) -> Term {
    let mut term = requested.clone();
    let mut visited = HashSet::new();

    while visited.insert(term.clone()) {
        if offerings.is_empty() || offerings.iter().any(|o| o.is_term(&term)) {
            break;
        }
        match offerings.first() {
            Some(latest) if !latest.is_term(&term) => term = latest.term(),
            _ => break,
        }
    }
    term
}

/// Reverse edges: every cached detail that points at `ids`.
///
/// Each entry carries the relation as written on the other course's side
/// and that document's own term.
pub fn blocked_by(details: &[CourseDetail], ids: &[&str], fallback: &Term) -> Vec<BlockedCourse> {
    let mut blocked: Vec<BlockedCourse> = Vec::new();
    for detail in details {
        if ids.iter().any(|id| *id == detail.id) {
            continue;
        }
        for edge in detail.edges_to(ids) {
            let entry = BlockedCourse {
                id: detail.id.clone(),
                name: detail.name.clone(),
                relation: edge.relation.clone(),
                year: non_empty_or(&detail.year, &fallback.year),
                semester: non_empty_or(&detail.semester, &fallback.semester),
            };
            if !blocked.contains(&entry) {
                blocked.push(entry);
            }
        }
    }
    blocked
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() { fallback } else { value }.to_string()
}

impl Synchronizer {
    /// Detail view of a course, scraping on a cache miss.
    ///
    /// `Ok(None)` means the upstream could not provide the course.
    pub async fn course_detail(
        &self,
        id: &str,
        dept: &str,
        degree: &str,
        requested: &Term,
    ) -> Result<Option<CourseView>> {
        let key = CourseKey::resolve(id, dept, degree);
        let candidates = key.candidates();

        let offerings = self
            .store
            .find_course(&candidates)
            .await?
            .map(|record| record.offerings)
            .unwrap_or_default();

        let term = route_term(&offerings, requested);
        if &term != requested {
            log::info!(
                "Course {} not offered in {}, routing to latest offering {}",
                id,
                requested,
                term
            );
        }

        let referencing = self.store.details_referencing(&candidates).await?;
        let blocked = blocked_by(&referencing, &candidates, &term);

        if let Some(detail) = self.cached_detail(&key, &term).await? {
            return Ok(Some(annotate(detail, offerings, blocked)));
        }

        let _guard = self
            .detail_flights
            .acquire((key.full.clone(), term.clone()))
            .await;

        if let Some(detail) = self.cached_detail(&key, &term).await? {
            return Ok(Some(annotate(detail, offerings, blocked)));
        }

        log::info!("Course {} not complete in cache for {}, scraping", key.full, term);
        let mut detail = match self.source.course_detail(&key, &term).await {
            Ok(detail) => detail,
            Err(e) => {
                log::error!("Failed to fetch course details for {}: {}", key.full, e);
                return Ok(None);
            }
        };

        detail.id = key.full.clone();
        detail.year = term.year.clone();
        detail.semester = term.semester.clone();
        self.store
            .upsert_detail(Cached::new(detail.clone(), self.detail_ttl()))
            .await?;

        Ok(Some(annotate(detail, offerings, blocked)))
    }

    /// A cached detail complete enough to skip scraping.
    ///
    /// Tries the full id, then the id as requested when the first lookup
    /// is missing, expired, or nameless (a failed scrape that got stored).
    async fn cached_detail(&self, key: &CourseKey, term: &Term) -> Result<Option<CourseDetail>> {
        let now = Utc::now();
        let primary = self
            .store
            .find_detail(&key.full, term)
            .await?
            .filter(|c| c.is_fresh(now));

        let found = match primary {
            Some(c) if !c.value.name.is_empty() => Some(c),
            _ if key.requested != key.full => self
                .store
                .find_detail(&key.requested, term)
                .await?
                .filter(|c| c.is_fresh(now)),
            other => other,
        };

        Ok(found
            .map(Cached::into_value)
            .filter(|d| !d.related_courses.is_empty()))
    }
}

fn annotate(
    detail: CourseDetail,
    offerings: Vec<Offering>,
    blocked: Vec<BlockedCourse>,
) -> CourseView {
    CourseView {
        detail,
        offerings,
        blocked_courses: blocked,
    }
}
