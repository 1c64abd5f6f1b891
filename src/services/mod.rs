//! Service layer for talking to the upstream catalog.
//!
//! This module contains:
//! - Form submission and legacy decoding (`Fetcher`)
//! - Page parsing into typed records (`extract`)
//! - The `CourseSource` seam the synchronizer pulls from

pub mod extract;
pub mod fetcher;
mod source;

pub use extract::{Extracted, PageKind};
pub use fetcher::{Fetcher, FormRequest};
pub use source::{CourseSource, UpstreamSource};
