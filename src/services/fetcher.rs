// src/services/fetcher.rs

//! Charset-aware fetcher for the upstream form endpoint.
//!
//! Every page comes from one endpoint; the `step` field selects which.
//! No retries: transport errors go straight back to the caller.

use reqwest::Client;
use reqwest::header::REFERER;

use crate::error::{AppError, Result};
use crate::models::{Term, UpstreamConfig};
use crate::services::extract::PageKind;
use crate::utils::http::{create_async_client, decode_legacy};

/// A term-scoped form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormRequest {
    Departments,
    CourseList {
        dept: String,
        degree: String,
        term: Term,
    },
    CourseDetail {
        course: String,
        dept: String,
        degree: String,
        term: Term,
    },
}

impl FormRequest {
    pub fn kind(&self) -> PageKind {
        match self {
            FormRequest::Departments => PageKind::Departments,
            FormRequest::CourseList { .. } => PageKind::CourseList,
            FormRequest::CourseDetail { .. } => PageKind::CourseDetail,
        }
    }

    /// Form fields in submission order.
    pub fn fields(&self, lang: &str) -> Vec<(&'static str, String)> {
        let step = self.kind().step().to_string();
        let mut fields = vec![
            ("rc_rowid", String::new()),
            ("lang", lang.to_string()),
            ("st", "s".to_string()),
            ("step", step),
        ];

        match self {
            FormRequest::Departments => {}
            FormRequest::CourseList { dept, degree, term } => {
                fields.extend([
                    ("oc_course_name", String::new()),
                    ("on_course_ins", "0".to_string()),
                    ("on_course_ins_list", "0".to_string()),
                    ("on_course_department", dept.clone()),
                    ("on_course_department_list", dept.clone()),
                    ("on_course_degree_level", degree.clone()),
                    ("on_course_degree_level_list", degree.clone()),
                    ("on_course", String::new()),
                    ("on_semester", term.semester.clone()),
                    ("on_year", term.year.clone()),
                ]);
                fields.extend(
                    [
                        "on_hours",
                        "on_credit_points",
                        "oc_lecturer_first_name",
                        "oc_lecturer_last_name",
                        "on_common",
                        "on_lang",
                        "oc_end_time",
                        "oc_start_time",
                        "on_campus",
                    ]
                    .map(|name| (name, String::new())),
                );
            }
            FormRequest::CourseDetail {
                course,
                dept,
                degree,
                term,
            } => {
                fields.extend([
                    ("rn_course", course.clone()),
                    ("rn_course_department", dept.clone()),
                    ("rn_course_degree_level", degree.clone()),
                    ("rn_year", term.year.clone()),
                    ("rn_semester", term.semester.clone()),
                    ("rn_course_ins", "0".to_string()),
                    ("rn_course_details", String::new()),
                ]);
            }
        }

        fields
    }
}

/// Posts form requests and returns decoded page text.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    endpoint: String,
    lang: String,
}

impl Fetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            endpoint: config.endpoint.clone(),
            lang: config.lang.clone(),
        })
    }

    /// Submit one form and decode the reply.
    pub async fn fetch(&self, request: &FormRequest) -> Result<String> {
        let step = request.kind().step();
        let mut builder = self
            .client
            .post(&self.endpoint)
            .form(&request.fields(&self.lang));

        if matches!(request, FormRequest::CourseDetail { .. }) {
            builder = builder.header(REFERER, &self.endpoint);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream {
                step,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        log::debug!("step {} returned {} bytes", step, bytes.len());
        Ok(decode_legacy(&bytes))
    }
}
