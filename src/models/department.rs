// src/models/department.rs

use serde::{Deserialize, Serialize};

/// An entry of the upstream department directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
}
