//! Synchronization pipeline between the upstream and the cache store.
//!
//! - `department_courses`: cached term view or 12-term backfill
//! - `course_detail`: cached or scraped detail with term fallback
//! - `departments`: TTL-refreshed department directory

pub mod coalesce;
mod department;
pub mod detail;
mod directory;
pub mod merge;
mod sync;

pub use coalesce::InFlight;
pub use detail::{blocked_by, route_term};
pub use merge::{backfill_window, merge_terms, project_term};
pub use sync::Synchronizer;
