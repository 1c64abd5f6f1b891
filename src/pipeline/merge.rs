// src/pipeline/merge.rs

//! Pure merge and projection steps of a department sync.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};

use crate::models::{CourseRecord, CourseRow, CourseSummary, SyncConfig, Term, compare_active_in};

/// Terms covered by a backfill: the requested year and the preceding
/// `history_years - 1` years, each with every configured semester.
///
/// A year that does not parse falls back to the current calendar year.
pub fn backfill_window(year: &str, config: &SyncConfig, today: DateTime<Utc>) -> Vec<Term> {
    let start = year.trim().parse::<i32>().unwrap_or_else(|_| today.year());
    (0..config.history_years as i32)
        .map(|offset| start - offset)
        .flat_map(|y| {
            config
                .semesters
                .iter()
                .map(move |s| Term::new(y.to_string(), s.clone()))
        })
        .collect()
}

/// Fold scraped term results into existing course records.
///
/// `existing` seeds the map so older history is preserved. Results are
/// folded in the order given, which keeps the name tie-break deterministic.
/// Every returned record has its offerings sorted newest first.
pub fn merge_terms(
    existing: Vec<CourseRecord>,
    scraped: &[(Term, Vec<CourseRow>)],
    now: DateTime<Utc>,
) -> Vec<CourseRecord> {
    let mut courses: BTreeMap<String, CourseRecord> = existing
        .into_iter()
        .map(|record| (record.id.clone(), record))
        .collect();

    for (term, rows) in scraped {
        for row in rows {
            courses
                .entry(row.id.clone())
                .or_insert_with(|| CourseRecord::first_sighting(row, now))
                .absorb(term, row, now);
        }
    }

    courses
        .into_values()
        .map(|mut record| {
            record.sort_offerings();
            record
        })
        .collect()
}

/// Courses offered in `term`, newest `activeIn` first.
///
/// Courses without an offering for the term are left out.
pub fn project_term(records: &[CourseRecord], term: &Term) -> Vec<CourseSummary> {
    let mut summaries: Vec<CourseSummary> =
        records.iter().filter_map(|r| r.summary_for(term)).collect();
    summaries.sort_by(|a, b| compare_active_in(&b.active_in, &a.active_in));
    summaries
}
