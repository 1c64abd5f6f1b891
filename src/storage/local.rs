//! Local filesystem storage implementation.
//!
//! Each entity set lives in one JSON file under the root directory.
//! Writes go to a temp file and are renamed into place; a single write
//! lock serializes read-modify-write cycles within the process.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{CourseDetail, CourseRecord, Department, Term};
use crate::storage::{CatalogStore, Cached, detail_key, in_department, merge_courses};

const COURSES: &str = "courses.json";
const DETAILS: &str = "details.json";
const DEPARTMENTS: &str = "departments.json";

type CourseMap = BTreeMap<String, CourseRecord>;
type DetailMap = BTreeMap<String, Cached<CourseDetail>>;

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AppError::store(format!("{key} is corrupt: {e}"))),
            None => Ok(None),
        }
    }

    async fn courses(&self) -> Result<CourseMap> {
        Ok(self.read_json(COURSES).await?.unwrap_or_default())
    }

    async fn details(&self) -> Result<DetailMap> {
        Ok(self.read_json(DETAILS).await?.unwrap_or_default())
    }
}

#[async_trait]
impl CatalogStore for LocalStorage {
    async fn all_courses(&self) -> Result<Vec<CourseRecord>> {
        Ok(self.courses().await?.into_values().collect())
    }

    async fn courses_in_department(&self, dept: &str) -> Result<Vec<CourseRecord>> {
        Ok(self
            .courses()
            .await?
            .into_values()
            .filter(|r| in_department(r, dept))
            .collect())
    }

    async fn find_course(&self, ids: &[&str]) -> Result<Option<CourseRecord>> {
        let mut courses = self.courses().await?;
        Ok(ids.iter().find_map(|id| courses.remove(*id)))
    }

    async fn upsert_courses(&self, records: &[CourseRecord]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut courses = self.courses().await?;
        merge_courses(&mut courses, records);
        self.write_json(COURSES, &courses).await?;
        log::debug!("{} course records stored", courses.len());
        Ok(())
    }

    async fn find_detail(&self, id: &str, term: &Term) -> Result<Option<Cached<CourseDetail>>> {
        Ok(self.details().await?.remove(&detail_key(id, term)))
    }

    async fn upsert_detail(&self, detail: Cached<CourseDetail>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut details = self.details().await?;
        details.insert(detail_key(&detail.value.id, &detail.value.term()), detail);
        self.write_json(DETAILS, &details).await
    }

    async fn all_details(&self) -> Result<Vec<CourseDetail>> {
        Ok(self
            .details()
            .await?
            .into_values()
            .map(Cached::into_value)
            .collect())
    }

    async fn load_departments(&self) -> Result<Option<Cached<Vec<Department>>>> {
        self.read_json(DEPARTMENTS).await
    }

    async fn replace_departments(&self, directory: Cached<Vec<Department>>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_json(DEPARTMENTS, &directory).await
    }
}
