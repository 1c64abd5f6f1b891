// src/models/course.rs

//! Course list, offering history, and term types.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A (year, semester) pair identifying one offering period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    pub year: String,
    pub semester: String,
}

impl Term {
    pub fn new(year: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            semester: semester.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.semester)
    }
}

/// Compare two `activeIn` labels.
///
/// Plain string ordering. It matches chronological order only while the
/// upstream keeps emitting zero-padded `YYYY-S` labels.
pub fn compare_active_in(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}

/// A course as listed for one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
    pub active_in: String,
}

/// A row of the upstream course list table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRow {
    pub id: String,
    pub active_in: String,
    pub name: String,
}

/// Record that a course was taught in a specific term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub year: String,
    pub semester: String,
    pub active_in: String,
    pub name: String,
}

impl Offering {
    pub fn term(&self) -> Term {
        Term::new(&self.year, &self.semester)
    }

    pub fn is_term(&self, term: &Term) -> bool {
        self.year == term.year && self.semester == term.semester
    }

    fn summary(&self, course_id: &str) -> CourseSummary {
        CourseSummary {
            id: course_id.to_string(),
            name: self.name.clone(),
            active_in: self.active_in.clone(),
        }
    }
}

/// A course with its full offering history.
///
/// Records are created on first sighting and only ever grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    pub name: String,
    pub active_in: String,
    #[serde(default)]
    pub offerings: Vec<Offering>,
    pub last_updated: DateTime<Utc>,
}

impl CourseRecord {
    /// Start a record from the first list row that mentions the course.
    pub fn first_sighting(row: &CourseRow, now: DateTime<Utc>) -> Self {
        Self {
            id: row.id.clone(),
            name: row.name.clone(),
            active_in: row.active_in.clone(),
            offerings: Vec::new(),
            last_updated: now,
        }
    }

    pub fn has_history(&self) -> bool {
        !self.offerings.is_empty()
    }

    pub fn offering_for(&self, term: &Term) -> Option<&Offering> {
        self.offerings.iter().find(|o| o.is_term(term))
    }

    /// Fold one scraped row for `term` into this record.
    ///
    /// The display name follows the row only when its `activeIn` sorts
    /// strictly later. At most one offering is kept per term.
    pub fn absorb(&mut self, term: &Term, row: &CourseRow, now: DateTime<Utc>) {
        if compare_active_in(&row.active_in, &self.active_in) == Ordering::Greater {
            self.name = row.name.clone();
            self.active_in = row.active_in.clone();
            self.last_updated = now;
        }

        if self.offering_for(term).is_none() {
            self.offerings.push(Offering {
                year: term.year.clone(),
                semester: term.semester.clone(),
                active_in: row.active_in.clone(),
                name: row.name.clone(),
            });
        }
    }

    /// Fold another copy of the same course into this one.
    ///
    /// Offerings are unioned by term, so neither side loses history.
    pub fn merge(&mut self, other: CourseRecord) {
        let CourseRecord {
            name,
            active_in,
            offerings,
            last_updated,
            ..
        } = other;

        if compare_active_in(&active_in, &self.active_in) == Ordering::Greater {
            self.name = name;
            self.active_in = active_in;
        }
        for offering in offerings {
            if self.offering_for(&offering.term()).is_none() {
                self.offerings.push(offering);
            }
        }
        self.last_updated = self.last_updated.max(last_updated);
        self.sort_offerings();
    }

    /// Sort offerings newest first.
    pub fn sort_offerings(&mut self) {
        self.offerings
            .sort_by(|a, b| compare_active_in(&b.active_in, &a.active_in));
    }

    /// Project this record onto a single term.
    pub fn summary_for(&self, term: &Term) -> Option<CourseSummary> {
        self.offering_for(term).map(|o| o.summary(&self.id))
    }
}

/// Canonical identity of a requested course.
///
/// Callers sometimes pass the full `dept.degree.number` id and sometimes
/// only the course number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseKey {
    /// The id exactly as requested
    pub requested: String,
    /// `dept.degree.number`
    pub full: String,
    pub dept: String,
    pub degree: String,
    /// Course number as the upstream expects it in `rn_course`
    pub number: String,
}

impl CourseKey {
    pub fn resolve(id: &str, dept: &str, degree: &str) -> Self {
        let id = id.trim();
        let parts: Vec<&str> = id.split('.').collect();
        if let [d, g, n] = parts.as_slice() {
            if [d, g, n].iter().all(|p| !p.is_empty()) {
                return Self {
                    requested: id.to_string(),
                    full: id.to_string(),
                    dept: d.to_string(),
                    degree: g.to_string(),
                    number: n.to_string(),
                };
            }
        }

        Self {
            requested: id.to_string(),
            full: format!("{dept}.{degree}.{id}"),
            dept: dept.to_string(),
            degree: degree.to_string(),
            number: id.to_string(),
        }
    }

    /// Ids under which this course may have been stored.
    pub fn candidates(&self) -> Vec<&str> {
        if self.full == self.requested {
            vec![self.full.as_str()]
        } else {
            vec![self.full.as_str(), self.requested.as_str()]
        }
    }
}
