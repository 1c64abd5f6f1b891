// src/services/source.rs

//! Typed access to the upstream catalog.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{CourseDetail, CourseKey, CourseRow, Department, Term, UpstreamConfig};
use crate::services::extract::{Extracted, PageKind, extract};
use crate::services::fetcher::{Fetcher, FormRequest};

/// Where course data comes from when the cache misses.
#[async_trait]
pub trait CourseSource: Send + Sync {
    /// The department directory.
    async fn departments(&self) -> Result<Vec<Department>>;

    /// Course list rows of one department for one term.
    async fn course_list(&self, dept: &str, degree: &str, term: &Term) -> Result<Vec<CourseRow>>;

    /// Detail document of one course for one term.
    async fn course_detail(&self, key: &CourseKey, term: &Term) -> Result<CourseDetail>;
}

/// [`CourseSource`] backed by the live upstream form endpoint.
#[derive(Clone)]
pub struct UpstreamSource {
    fetcher: Fetcher,
}

impl UpstreamSource {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
        })
    }

    async fn fetch_page(&self, request: FormRequest) -> Result<Extracted> {
        let kind = request.kind();
        let html = self.fetcher.fetch(&request).await?;
        extract(kind, &html)
    }
}

fn unexpected(kind: PageKind) -> AppError {
    AppError::extract(kind, "extractor returned a different page kind")
}

#[async_trait]
impl CourseSource for UpstreamSource {
    async fn departments(&self) -> Result<Vec<Department>> {
        match self.fetch_page(FormRequest::Departments).await? {
            Extracted::Departments(depts) => Ok(depts),
            _ => Err(unexpected(PageKind::Departments)),
        }
    }

    async fn course_list(&self, dept: &str, degree: &str, term: &Term) -> Result<Vec<CourseRow>> {
        let request = FormRequest::CourseList {
            dept: dept.to_string(),
            degree: degree.to_string(),
            term: term.clone(),
        };
        match self.fetch_page(request).await? {
            Extracted::CourseList(rows) => Ok(rows),
            _ => Err(unexpected(PageKind::CourseList)),
        }
    }

    async fn course_detail(&self, key: &CourseKey, term: &Term) -> Result<CourseDetail> {
        let request = FormRequest::CourseDetail {
            course: key.number.clone(),
            dept: key.dept.clone(),
            degree: key.degree.clone(),
            term: term.clone(),
        };
        match self.fetch_page(request).await? {
            Extracted::Detail(detail) => Ok(detail),
            _ => Err(unexpected(PageKind::CourseDetail)),
        }
    }
}
