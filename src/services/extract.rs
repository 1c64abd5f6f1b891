// src/services/extract.rs

//! HTML extractor for the three upstream page kinds.
//!
//! Each page kind has one strict schema. A page whose anchor container is
//! missing is malformed and yields an error; a field missing inside a
//! well-formed page yields an empty value.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{AppError, Result};
use crate::models::{CourseDetail, CourseRow, Department, RelatedCourse, RelationParams};
use crate::utils::{extract_call_params, normalize_whitespace};

/// Related-course id as printed before each link (`202.1.1011`).
static COURSE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{3}\.[0-9]\.[0-9]{4}").expect("course id pattern is valid")
});

/// Detail page labels.
mod labels {
    pub const NUMBER: &str = "מספר קורס";
    pub const NAME: &str = "שם הקורס";
    pub const KIND: [&str; 2] = ["סוג המסגרת", "סוג קורס"];
    pub const EXAM: [&str; 2] = ["אופן בחינה", "מבחן"];
    pub const GRADE_TYPE: [&str; 2] = ["סוג ציון", "סוג הציון"];
    pub const POINTS: &str = "נקודות זכות";
    pub const HOURS: &str = "שעות";
    pub const ABSTRACT: &str = "תקציר";
    pub const SYLLABUS: &str = "קובץ סילבוס";
    pub const RELATED: &str = "קורסים קשורים";
}

/// Upstream page kinds, one per form step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Departments,
    CourseList,
    CourseDetail,
}

impl PageKind {
    /// The `step` form value that produces this page.
    pub fn step(self) -> u8 {
        match self {
            PageKind::Departments => 1,
            PageKind::CourseList => 2,
            PageKind::CourseDetail => 3,
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageKind::Departments => "department directory",
            PageKind::CourseList => "course list",
            PageKind::CourseDetail => "course detail",
        };
        f.write_str(name)
    }
}

/// Records extracted from one page.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Departments(Vec<Department>),
    CourseList(Vec<CourseRow>),
    Detail(CourseDetail),
}

/// Parse a decoded page according to its kind.
pub fn extract(kind: PageKind, html: &str) -> Result<Extracted> {
    let document = Html::parse_document(html);
    match kind {
        PageKind::Departments => parse_departments(&document).map(Extracted::Departments),
        PageKind::CourseList => parse_course_list(&document).map(Extracted::CourseList),
        PageKind::CourseDetail => parse_course_detail(&document).map(Extracted::Detail),
    }
}

/// Extract the department directory (step 1).
pub fn parse_departments(document: &Html) -> Result<Vec<Department>> {
    let kind = PageKind::Departments;
    let list = select_first(document, kind, "#on_course_department_list")?;
    let option_sel = selector("option")?;

    Ok(list
        .select(&option_sel)
        .filter_map(|option| {
            let id = option.value().attr("value").unwrap_or("").trim();
            let name = element_text(option);
            (!id.is_empty() && !name.is_empty()).then(|| Department {
                id: id.to_string(),
                name,
            })
        })
        .collect())
}

/// Extract course list rows (step 2) in document order.
pub fn parse_course_list(document: &Html) -> Result<Vec<CourseRow>> {
    let kind = PageKind::CourseList;
    let table = select_first(document, kind, "#courseTable")?;
    let row_sel = selector("tbody tr")?;
    let cell_sel = selector("td")?;

    Ok(table
        .select(&row_sel)
        .filter_map(|row| {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            match cells.as_slice() {
                [id, active_in, name, ..] => Some(CourseRow {
                    id: element_text(*id),
                    active_in: element_text(*active_in),
                    name: element_text(*name),
                }),
                _ => None,
            }
        })
        .collect())
}

/// Extract a course detail document (step 3).
///
/// `year`/`semester` are left empty; the caller knows which term it asked for.
pub fn parse_course_detail(document: &Html) -> Result<CourseDetail> {
    let kind = PageKind::CourseDetail;
    let props = Props::find(document)?;

    let first_of = |candidates: &[&str]| {
        candidates
            .iter()
            .map(|label| props.value_text(label))
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    };

    let points = props.value_text(labels::POINTS);
    let syllabus_params = props
        .item(labels::SYLLABUS)
        .and_then(|item| {
            let link_sel = selector("a").ok()?;
            item.select(&link_sel).next()
        })
        .and_then(|link| link.value().attr("href"))
        .and_then(extract_call_params);

    let semester_name = match select_first(document, kind, ".CourseName") {
        Ok(el) => element_text(el),
        Err(_) => String::new(),
    };

    Ok(CourseDetail {
        id: props.value_text(labels::NUMBER),
        name: props.value_text(labels::NAME),
        kind: first_of(&labels::KIND),
        exam: first_of(&labels::EXAM),
        grade_type: first_of(&labels::GRADE_TYPE),
        points: points.lines().next().unwrap_or("").trim().to_string(),
        hours: props.value_text(labels::HOURS),
        summary: props.value_text(labels::ABSTRACT),
        semester_name,
        syllabus_params,
        related_courses: props
            .value(labels::RELATED)
            .map(parse_related_courses)
            .unwrap_or_default(),
        lecturers: parse_lecturers(document)?,
        year: String::new(),
        semester: String::new(),
    })
}

/// The label/value list of a detail page (`.props li` with `.key`/`.val`).
struct Props<'a> {
    items: Vec<ElementRef<'a>>,
    key_sel: Selector,
    val_sel: Selector,
}

impl<'a> Props<'a> {
    fn find(document: &'a Html) -> Result<Self> {
        let props = select_first(document, PageKind::CourseDetail, ".props")?;
        let item_sel = selector("li")?;
        Ok(Self {
            items: props.select(&item_sel).collect(),
            key_sel: selector(".key")?,
            val_sel: selector(".val")?,
        })
    }

    /// First item whose key contains `label`.
    fn item(&self, label: &str) -> Option<ElementRef<'a>> {
        self.items.iter().copied().find(|item| {
            item.select(&self.key_sel)
                .any(|key| key.text().collect::<String>().contains(label))
        })
    }

    fn value(&self, label: &str) -> Option<ElementRef<'a>> {
        self.item(label)
            .and_then(|item| item.select(&self.val_sel).next())
    }

    fn value_text(&self, label: &str) -> String {
        self.value(label).map(element_text).unwrap_or_default()
    }
}

/// Walk the inline run of links in the related-courses value.
///
/// The related id sits in the text node before each link and the relation
/// label in the text node after it.
fn parse_related_courses(value: ElementRef) -> Vec<RelatedCourse> {
    value
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
        .filter_map(|link| {
            let prev = sibling_text(link.prev_sibling().map(|n| n.value()));
            let id = COURSE_ID.find(prev)?.as_str().to_string();

            let values = extract_call_params(link.value().attr("href")?)?;
            let params = RelationParams::from_tuple(&values)?;

            let next = sibling_text(link.next_sibling().map(|n| n.value()));
            let relation = normalize_whitespace(next.split('\n').next().unwrap_or(""));

            Some(RelatedCourse {
                id,
                name: element_text(link),
                relation,
                params,
            })
        })
        .collect()
}

fn sibling_text(node: Option<&Node>) -> &str {
    node.and_then(Node::as_text).map(|t| &**t).unwrap_or("")
}

/// Staff table rows as `role: name`, without duplicates.
fn parse_lecturers(document: &Html) -> Result<Vec<String>> {
    let row_sel = selector(".CourseStaff tbody tr")?;
    let cell_sel = selector("td")?;

    let mut lecturers: Vec<String> = Vec::new();
    for row in document.select(&row_sel) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        let [role, name, ..] = cells.as_slice() else {
            continue;
        };
        let name = element_text(*name);
        if name.is_empty() {
            continue;
        }
        let entry = format!("{}: {}", element_text(*role), name);
        if !lecturers.contains(&entry) {
            lecturers.push(entry);
        }
    }
    Ok(lecturers)
}

fn selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::extract("selector", format!("'{s}': {e:?}")))
}

fn select_first<'a>(document: &'a Html, kind: PageKind, css: &str) -> Result<ElementRef<'a>> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .next()
        .ok_or_else(|| AppError::extract(kind, format!("missing {css}")))
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
