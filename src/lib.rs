// src/lib.rs

//! BGU course catalog synchronization and caching engine

pub mod error;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod services;
pub mod storage;
pub mod utils;

pub use query::{Catalog, TermQuery};
