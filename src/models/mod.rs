// src/models/mod.rs

//! Domain models for the catalog engine.
//!
//! This module contains all data structures used throughout the crate,
//! organized by their primary purpose.

mod config;
mod course;
mod department;
mod detail;

// Re-export all public types
pub use config::{CacheConfig, Config, QueryDefaults, StorageConfig, SyncConfig, UpstreamConfig};
pub use course::{
    CourseKey, CourseRecord, CourseRow, CourseSummary, Offering, Term, compare_active_in,
};
pub use department::Department;
pub use detail::{
    BlockedCourse, CourseDetail, CourseView, GroupedRelation, RelatedCourse, RelationParams,
};
