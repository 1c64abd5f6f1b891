// src/models/detail.rs

//! Course detail documents and the course relation graph.

use serde::{Deserialize, Serialize};

use crate::models::{Offering, Term};

/// Upstream form parameters embedded in a related-course link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationParams {
    pub dept: String,
    pub degree: String,
    pub course: String,
    pub year: String,
    pub semester: String,
}

impl RelationParams {
    /// Build from a parenthesized link tuple; needs at least five values.
    pub fn from_tuple(values: &[String]) -> Option<Self> {
        match values {
            [dept, degree, course, year, semester, ..] => Some(Self {
                dept: dept.clone(),
                degree: degree.clone(),
                course: course.clone(),
                year: year.clone(),
                semester: semester.clone(),
            }),
            _ => None,
        }
    }
}

/// Directed edge from one course to another.
///
/// `relation` is free upstream text (prerequisite, parallel, ...), not a
/// closed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedCourse {
    pub id: String,
    pub name: String,
    pub relation: String,
    pub params: RelationParams,
}

/// Term-specific course detail document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub exam: String,
    #[serde(default)]
    pub grade_type: String,
    #[serde(default)]
    pub points: String,
    #[serde(default)]
    pub hours: String,
    #[serde(rename = "abstract", default)]
    pub summary: String,
    #[serde(default)]
    pub semester_name: String,
    #[serde(default)]
    pub syllabus_params: Option<Vec<String>>,
    #[serde(default)]
    pub related_courses: Vec<RelatedCourse>,
    #[serde(default)]
    pub lecturers: Vec<String>,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub semester: String,
}

impl CourseDetail {
    pub fn term(&self) -> Term {
        Term::new(&self.year, &self.semester)
    }

    /// Edges pointing at any of `ids`.
    pub fn edges_to<'a>(&'a self, ids: &'a [&str]) -> impl Iterator<Item = &'a RelatedCourse> {
        self.related_courses
            .iter()
            .filter(move |r| ids.iter().any(|id| *id == r.id))
    }

    /// Merge related-course edges that differ only by degree level.
    pub fn grouped_related(&self) -> Vec<GroupedRelation> {
        let mut groups: Vec<GroupedRelation> = Vec::new();
        for edge in &self.related_courses {
            let existing = groups.iter_mut().find(|g| {
                g.params.dept == edge.params.dept
                    && g.params.course == edge.params.course
                    && g.name == edge.name
                    && g.relation == edge.relation
            });
            match existing {
                Some(group) => {
                    if !group.degrees.contains(&edge.params.degree) {
                        group.degrees.push(edge.params.degree.clone());
                    }
                }
                None => groups.push(GroupedRelation {
                    id: edge.id.clone(),
                    name: edge.name.clone(),
                    relation: edge.relation.clone(),
                    degrees: vec![edge.params.degree.clone()],
                    params: edge.params.clone(),
                }),
            }
        }
        groups
    }
}

/// A related course listed once for all the degree levels it appears under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedRelation {
    pub id: String,
    pub name: String,
    pub relation: String,
    pub degrees: Vec<String>,
    pub params: RelationParams,
}

/// Reverse of a [`RelatedCourse`] edge, derived at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedCourse {
    pub id: String,
    pub name: String,
    pub relation: String,
    pub year: String,
    pub semester: String,
}

/// A detail document annotated with history and reverse edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    #[serde(flatten)]
    pub detail: CourseDetail,
    pub offerings: Vec<Offering>,
    pub blocked_courses: Vec<BlockedCourse>,
}
