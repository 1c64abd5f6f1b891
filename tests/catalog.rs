//! End-to-end behavior of `Catalog` against a scripted upstream.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};

use bgu_catalog::error::{AppError, Result};
use bgu_catalog::models::{
    Config, CourseDetail, CourseKey, CourseRecord, CourseRow, CourseSummary, Department, Offering,
    RelatedCourse, RelationParams, Term,
};
use bgu_catalog::storage::{Cached, CatalogStore, LocalStorage, MemoryStore, cache};
use bgu_catalog::{Catalog, TermQuery};
use tempfile::TempDir;

/// In-process upstream with per-term responses and call counters.
#[derive(Default)]
struct ScriptedSource {
    rows: HashMap<Term, Vec<CourseRow>>,
    failing_terms: HashSet<Term>,
    details: HashMap<(String, Term), CourseDetail>,
    departments: Option<Vec<Department>>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    directory_calls: AtomicUsize,
}

impl ScriptedSource {
    fn with_rows(mut self, term: Term, rows: Vec<CourseRow>) -> Self {
        self.rows.insert(term, rows);
        self
    }

    fn failing(mut self, term: Term) -> Self {
        self.failing_terms.insert(term);
        self
    }

    fn with_detail(mut self, detail: CourseDetail) -> Self {
        let term = Term::new(&detail.year, &detail.semester);
        self.details.insert((detail.id.clone(), term), detail);
        self
    }

    fn with_departments(mut self, departments: Vec<Department>) -> Self {
        self.departments = Some(departments);
        self
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn directory_calls(&self) -> usize {
        self.directory_calls.load(Ordering::SeqCst)
    }
}

fn unavailable(step: u8) -> AppError {
    AppError::Upstream { step, status: 503 }
}

#[async_trait]
impl bgu_catalog::services::CourseSource for ScriptedSource {
    async fn departments(&self) -> Result<Vec<Department>> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.departments.clone().ok_or_else(|| unavailable(1))
    }

    async fn course_list(&self, _dept: &str, _degree: &str, term: &Term) -> Result<Vec<CourseRow>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.failing_terms.contains(term) {
            return Err(unavailable(2));
        }
        Ok(self.rows.get(term).cloned().unwrap_or_default())
    }

    async fn course_detail(&self, key: &CourseKey, term: &Term) -> Result<CourseDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.details
            .get(&(key.full.clone(), term.clone()))
            .cloned()
            .ok_or_else(|| unavailable(3))
    }
}

fn row(id: &str, active_in: &str, name: &str) -> CourseRow {
    CourseRow {
        id: id.into(),
        active_in: active_in.into(),
        name: name.into(),
    }
}

fn offering(year: &str, semester: &str, name: &str) -> Offering {
    Offering {
        year: year.into(),
        semester: semester.into(),
        active_in: format!("{year}-{semester}"),
        name: name.into(),
    }
}

fn edge(to: &str, relation: &str) -> RelatedCourse {
    let parts: Vec<&str> = to.split('.').collect();
    RelatedCourse {
        id: to.into(),
        name: format!("name of {to}"),
        relation: relation.into(),
        params: RelationParams {
            dept: parts[0].into(),
            degree: parts[1].into(),
            course: parts[2].into(),
            year: "2026".into(),
            semester: "1".into(),
        },
    }
}

fn detail(id: &str, term: &Term, related: Vec<RelatedCourse>) -> CourseDetail {
    CourseDetail {
        id: id.into(),
        name: format!("name of {id}"),
        points: "3.5".into(),
        related_courses: related,
        year: term.year.clone(),
        semester: term.semester.clone(),
        ..CourseDetail::default()
    }
}

fn catalog(source: Arc<ScriptedSource>, store: Arc<dyn CatalogStore>) -> Catalog {
    Catalog::new(source, store, &Config::default())
}

fn dept_query(year: &str, semester: &str) -> TermQuery {
    TermQuery::new().dept("202").degree("1").term(year, semester)
}

/// Rows spread over the 2026 backfill window.
fn department_source() -> ScriptedSource {
    ScriptedSource::default()
        .with_rows(
            Term::new("2026", "2"),
            vec![
                row("202.1.0001", "2026-2", "Calculus"),
                row("202.1.0002", "2026-2", "Algebra"),
            ],
        )
        .with_rows(
            Term::new("2025", "1"),
            vec![
                row("202.1.0001", "2025-1", "Calculus A"),
                row("202.1.0003", "2025-1", "Logic"),
            ],
        )
        .with_rows(Term::new("2024", "3"), vec![row("202.1.0001", "2024-3", "Calculus Old")])
}

#[tokio::test]
async fn backfill_scrapes_window_and_projects_term() {
    let source = Arc::new(department_source());
    let store = Arc::new(MemoryStore::new());
    let catalog = catalog(source.clone(), store.clone());

    let courses = catalog.courses_by_department(&dept_query("2026", "2")).await;

    assert_eq!(source.list_calls(), 12);
    assert_eq!(courses.len(), 2);
    assert_eq!(store.course_count(), 3);

    let calculus = store
        .find_course(&["202.1.0001"])
        .await
        .unwrap()
        .expect("calculus stored");
    assert_eq!(calculus.name, "Calculus");
    assert_eq!(calculus.active_in, "2026-2");
    let labels: Vec<&str> = calculus.offerings.iter().map(|o| o.active_in.as_str()).collect();
    assert_eq!(labels, vec!["2026-2", "2025-1", "2024-3"]);
}

#[tokio::test]
async fn backfill_is_idempotent() {
    let first_store = Arc::new(MemoryStore::new());
    catalog(Arc::new(department_source()), first_store.clone())
        .courses_by_department(&dept_query("2026", "2"))
        .await;
    let first = first_store.all_courses().await.unwrap();

    // Replay the same responses onto a store that already holds the result.
    let replay = Arc::new(MemoryStore::new());
    replay.upsert_courses(&first).await.unwrap();
    replay.upsert_courses(&first).await.unwrap();
    assert_eq!(replay.course_count(), first.len());

    let merged = bgu_catalog::pipeline::merge_terms(
        replay.all_courses().await.unwrap(),
        &[
            (Term::new("2026", "2"), vec![row("202.1.0001", "2026-2", "Calculus")]),
            (Term::new("2025", "1"), vec![row("202.1.0001", "2025-1", "Calculus A")]),
        ],
        Utc::now(),
    );
    let before: Vec<_> = first.iter().map(|r| (&r.id, &r.name, &r.offerings)).collect();
    let after: Vec<_> = merged.iter().map(|r| (&r.id, &r.name, &r.offerings)).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn offerings_stay_unique_and_sorted() {
    let source = Arc::new(
        department_source()
            .with_rows(Term::new("2023", "1"), vec![row("202.1.0001", "2023-1", "Calculus 0")])
            .with_rows(Term::new("2026", "1"), vec![row("202.1.0001", "2026-1", "Calculus B")]),
    );
    let store = Arc::new(MemoryStore::new());
    catalog(source, store.clone())
        .courses_by_department(&dept_query("2026", "2"))
        .await;

    for record in store.all_courses().await.unwrap() {
        let terms: HashSet<Term> = record.offerings.iter().map(Offering::term).collect();
        assert_eq!(terms.len(), record.offerings.len(), "duplicate term in {}", record.id);
        assert!(
            record
                .offerings
                .windows(2)
                .all(|w| w[0].active_in >= w[1].active_in),
            "unsorted offerings in {}",
            record.id
        );
    }
}

#[tokio::test]
async fn failing_terms_are_absent_but_others_merge() {
    let source = Arc::new(
        department_source()
            .failing(Term::new("2025", "1"))
            .failing(Term::new("2023", "3")),
    );
    let store = Arc::new(MemoryStore::new());
    let courses = catalog(source.clone(), store.clone())
        .courses_by_department(&dept_query("2026", "2"))
        .await;

    assert_eq!(source.list_calls(), 12);
    assert_eq!(courses.len(), 2);

    let calculus = store.find_course(&["202.1.0001"]).await.unwrap().unwrap();
    let labels: Vec<&str> = calculus.offerings.iter().map(|o| o.active_in.as_str()).collect();
    assert_eq!(labels, vec!["2026-2", "2024-3"]);
    assert!(store.find_course(&["202.1.0003"]).await.unwrap().is_none());
}

#[tokio::test]
async fn single_seeded_row_is_returned_exactly() {
    let source = Arc::new(ScriptedSource::default().with_rows(
        Term::new("2026", "2"),
        vec![row("202.1.9999", "2026-2", "Test")],
    ));
    let courses = catalog(source, Arc::new(MemoryStore::new()))
        .courses_by_department(&dept_query("2026", "2"))
        .await;

    assert_eq!(
        courses,
        vec![CourseSummary {
            id: "202.1.9999".into(),
            name: "Test".into(),
            active_in: "2026-2".into(),
        }]
    );
}

#[tokio::test]
async fn cached_history_triggers_no_fetch() {
    let source = Arc::new(department_source());
    let store = Arc::new(MemoryStore::new());
    store
        .upsert_courses(&[CourseRecord {
            id: "202.1.0005".into(),
            name: "X".into(),
            active_in: "2025-2".into(),
            offerings: vec![offering("2025", "2", "X")],
            last_updated: Utc::now(),
        }])
        .await
        .unwrap();

    let courses = catalog(source.clone(), store)
        .courses_by_department(&dept_query("2025", "2"))
        .await;

    assert_eq!(source.list_calls(), 0);
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].name, "X");
}

#[tokio::test]
async fn concurrent_identical_syncs_share_one_backfill() {
    let source = Arc::new(department_source());
    let store = Arc::new(MemoryStore::new());
    let catalog = catalog(source.clone(), store);
    let query = dept_query("2026", "2");

    let (a, b) = tokio::join!(
        catalog.courses_by_department(&query),
        catalog.courses_by_department(&query)
    );

    assert_eq!(source.list_calls(), 12);
    assert_eq!(a, b);
}

#[tokio::test]
async fn requests_for_different_terms_share_one_backfill() {
    let source = Arc::new(department_source());
    let catalog = catalog(source.clone(), Arc::new(MemoryStore::new()));

    let (q1, q2) = (dept_query("2026", "1"), dept_query("2026", "2"));
    let (first, second) = tokio::join!(
        catalog.courses_by_department(&q1),
        catalog.courses_by_department(&q2)
    );

    assert_eq!(source.list_calls(), 12);
    assert!(first.is_empty());
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn waiting_caller_is_served_from_finished_backfill() {
    let source = Arc::new(
        ScriptedSource::default()
            .with_rows(Term::new("2026", "2"), vec![row("202.1.0001", "2026-2", "Calculus")])
            .with_rows(Term::new("2021", "1"), vec![row("202.1.0001", "2021-1", "Calculus")]),
    );
    let store = Arc::new(MemoryStore::new());
    let catalog = catalog(source.clone(), store.clone());

    let (q1, q2) = (dept_query("2026", "2"), dept_query("2022", "2"));
    let (recent, older) = tokio::join!(
        catalog.courses_by_department(&q1),
        catalog.courses_by_department(&q2)
    );

    assert_eq!(source.list_calls(), 12);
    assert_eq!(recent.len(), 1);
    assert!(older.is_empty());
    let stored = store.find_course(&["202.1.0001"]).await.unwrap().unwrap();
    assert_eq!(stored.offerings, vec![offering("2026", "2", "Calculus")]);
}

#[tokio::test]
async fn overlapping_backfills_on_shared_store_keep_all_history() {
    // Two engines over one store do not share in-flight locks.
    let source = Arc::new(
        ScriptedSource::default()
            .with_rows(Term::new("2026", "2"), vec![row("202.1.0001", "2026-2", "Calculus")])
            .with_rows(Term::new("2021", "1"), vec![row("202.1.0001", "2021-1", "Calculus")]),
    );
    let store = Arc::new(MemoryStore::new());
    let a = catalog(source.clone(), store.clone());
    let b = catalog(source.clone(), store.clone());

    let (q1, q2) = (dept_query("2026", "2"), dept_query("2022", "2"));
    tokio::join!(
        a.courses_by_department(&q1),
        b.courses_by_department(&q2)
    );

    assert_eq!(source.list_calls(), 24);
    let stored = store.find_course(&["202.1.0001"]).await.unwrap().unwrap();
    let labels: Vec<&str> = stored.offerings.iter().map(|o| o.active_in.as_str()).collect();
    assert_eq!(labels, vec!["2026-2", "2021-1"]);
}

#[tokio::test]
async fn department_sync_persists_to_disk() {
    let tmp = TempDir::new().unwrap();
    let source = Arc::new(department_source());
    let first = catalog(source.clone(), Arc::new(LocalStorage::new(tmp.path())))
        .courses_by_department(&dept_query("2026", "2"))
        .await;
    assert_eq!(source.list_calls(), 12);
    assert!(tmp.path().join("courses.json").exists());

    let cold = Arc::new(department_source());
    let second = catalog(cold.clone(), Arc::new(LocalStorage::new(tmp.path())))
        .courses_by_department(&dept_query("2026", "2"))
        .await;
    assert_eq!(cold.list_calls(), 0);
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_term_falls_back_to_latest_offering() {
    let offered = Term::new("2025", "2");
    let source = Arc::new(ScriptedSource::default().with_detail(detail(
        "202.1.0001",
        &offered,
        vec![edge("202.1.0004", "prerequisite")],
    )));
    let store = Arc::new(MemoryStore::new());
    store
        .upsert_courses(&[CourseRecord {
            id: "202.1.0001".into(),
            name: "Calculus".into(),
            active_in: "2025-2".into(),
            offerings: vec![offering("2025", "2", "Calculus"), offering("2024", "1", "Calculus")],
            last_updated: Utc::now(),
        }])
        .await
        .unwrap();
    let catalog = catalog(source.clone(), store);

    let routed = catalog
        .course_detail("202.1.0001", &dept_query("2026", "2"))
        .await
        .expect("routed detail");
    let direct = catalog
        .course_detail("202.1.0001", &dept_query("2025", "2"))
        .await
        .expect("direct detail");

    assert_eq!(routed, direct);
    assert_eq!(routed.detail.year, "2025");
    assert_eq!(routed.offerings.len(), 2);
    assert_eq!(source.detail_calls(), 1);
}

#[tokio::test]
async fn bare_course_number_resolves_to_full_id() {
    let term = Term::new("2026", "2");
    let source = Arc::new(ScriptedSource::default().with_detail(detail(
        "202.1.0001",
        &term,
        vec![edge("202.1.0004", "prerequisite")],
    )));
    let store = Arc::new(MemoryStore::new());
    let catalog = catalog(source.clone(), store.clone());

    let view = catalog
        .course_detail("0001", &dept_query("2026", "2"))
        .await
        .expect("detail");
    assert_eq!(view.detail.id, "202.1.0001");

    catalog.course_detail("202.1.0001", &dept_query("2026", "2")).await;
    assert_eq!(source.detail_calls(), 1);
    assert_eq!(store.detail_count(), 1);
}

#[tokio::test]
async fn related_edge_shows_up_as_blocked_course() {
    let term = Term::new("2026", "2");
    let source = Arc::new(
        ScriptedSource::default()
            .with_detail(detail("202.1.0001", &term, vec![edge("202.1.0002", "prerequisite")]))
            .with_detail(detail("202.1.0002", &term, vec![edge("202.1.0007", "parallel")])),
    );
    let catalog = catalog(source, Arc::new(MemoryStore::new()));
    let query = dept_query("2026", "2");

    let a = catalog.course_detail("202.1.0001", &query).await.unwrap();
    assert_eq!(a.detail.related_courses[0].relation, "prerequisite");

    let b = catalog.course_detail("202.1.0002", &query).await.unwrap();
    assert_eq!(b.blocked_courses.len(), 1);
    let blocked = &b.blocked_courses[0];
    assert_eq!(blocked.id, "202.1.0001");
    assert_eq!(blocked.relation, "prerequisite");
    assert_eq!((blocked.year.as_str(), blocked.semester.as_str()), ("2026", "2"));
}

#[tokio::test]
async fn detail_scrape_failure_is_none_and_not_stored() {
    let source = Arc::new(ScriptedSource::default());
    let store = Arc::new(MemoryStore::new());
    let view = catalog(source.clone(), store.clone())
        .course_detail("202.1.0404", &dept_query("2026", "2"))
        .await;

    assert!(view.is_none());
    assert_eq!(source.detail_calls(), 1);
    assert_eq!(store.detail_count(), 0);
}

#[tokio::test]
async fn nameless_full_id_detail_defers_to_requested_id() {
    let term = Term::new("2026", "2");
    let source = Arc::new(ScriptedSource::default());
    let store = Arc::new(MemoryStore::new());

    let mut nameless = detail("202.1.0001", &term, vec![edge("202.1.0004", "prerequisite")]);
    nameless.name.clear();
    let complete = detail("0001", &term, vec![edge("202.1.0004", "prerequisite")]);
    store.upsert_detail(Cached::new(nameless, None)).await.unwrap();
    store.upsert_detail(Cached::new(complete.clone(), None)).await.unwrap();

    let view = catalog(source.clone(), store)
        .course_detail("0001", &dept_query("2026", "2"))
        .await
        .expect("cached detail");

    assert_eq!(source.detail_calls(), 0);
    assert_eq!(view.detail, complete);
}

#[tokio::test]
async fn expired_detail_is_fetched_again() {
    let term = Term::new("2026", "2");
    let fresh = detail("202.1.0001", &term, vec![edge("202.1.0004", "prerequisite")]);
    let source = Arc::new(ScriptedSource::default().with_detail(fresh.clone()));
    let store = Arc::new(MemoryStore::new());

    let mut stale = fresh.clone();
    stale.name = "outdated".into();
    let fetched_at = Utc::now() - TimeDelta::hours(48);
    store
        .upsert_detail(Cached::fetched_at(stale, fetched_at, Some(cache::hours(24))))
        .await
        .unwrap();

    let mut config = Config::default();
    config.cache.detail_ttl_hours = Some(24);
    let catalog = Catalog::new(source.clone(), store, &config);
    let query = dept_query("2026", "2");

    let view = catalog.course_detail("202.1.0001", &query).await.unwrap();
    assert_eq!(source.detail_calls(), 1);
    assert_eq!(view.detail.name, fresh.name);

    catalog.course_detail("202.1.0001", &query).await.unwrap();
    assert_eq!(source.detail_calls(), 1);
}

#[tokio::test]
async fn detail_without_relations_is_rescraped() {
    let term = Term::new("2026", "2");
    let source =
        Arc::new(ScriptedSource::default().with_detail(detail("202.1.0001", &term, vec![])));
    let catalog = catalog(source.clone(), Arc::new(MemoryStore::new()));
    let query = dept_query("2026", "2");

    catalog.course_detail("202.1.0001", &query).await.unwrap();
    catalog.course_detail("202.1.0001", &query).await.unwrap();
    assert_eq!(source.detail_calls(), 2);
}

fn directory(names: &[&str]) -> Vec<Department> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Department {
            id: format!("{}", 200 + i),
            name: name.to_string(),
        })
        .collect()
}

async fn seed_directory(store: &MemoryStore, departments: Vec<Department>, age_hours: i64) {
    let fetched_at = Utc::now() - TimeDelta::hours(age_hours);
    store
        .replace_departments(Cached::fetched_at(departments, fetched_at, Some(cache::hours(24))))
        .await
        .unwrap();
}

#[tokio::test]
async fn fresh_directory_is_served_from_cache() {
    let source = Arc::new(ScriptedSource::default().with_departments(directory(&["New"])));
    let store = Arc::new(MemoryStore::new());
    seed_directory(&store, directory(&["Cached"]), 1).await;

    let departments = catalog(source.clone(), store).departments().await;
    assert_eq!(departments, directory(&["Cached"]));
    assert_eq!(source.directory_calls(), 0);
}

#[tokio::test]
async fn stale_directory_is_refreshed_once() {
    let source = Arc::new(ScriptedSource::default().with_departments(directory(&["Math", "CS"])));
    let store = Arc::new(MemoryStore::new());
    seed_directory(&store, directory(&["Old"]), 25).await;
    let catalog = catalog(source.clone(), store);

    assert_eq!(catalog.departments().await, directory(&["Math", "CS"]));
    assert_eq!(catalog.departments().await, directory(&["Math", "CS"]));
    assert_eq!(source.directory_calls(), 1);
}

#[tokio::test]
async fn empty_refresh_keeps_cached_directory() {
    let source = Arc::new(ScriptedSource::default().with_departments(Vec::new()));
    let store = Arc::new(MemoryStore::new());
    seed_directory(&store, directory(&["Math"]), 48).await;

    let departments = catalog(source, store).departments().await;
    assert_eq!(departments, directory(&["Math"]));
}

#[tokio::test]
async fn failed_refresh_serves_stale_or_empty() {
    let store = Arc::new(MemoryStore::new());
    seed_directory(&store, directory(&["Math"]), 48).await;
    let stale = catalog(Arc::new(ScriptedSource::default()), store).departments().await;
    assert_eq!(stale, directory(&["Math"]));

    let empty = catalog(Arc::new(ScriptedSource::default()), Arc::new(MemoryStore::new()))
        .departments()
        .await;
    assert!(empty.is_empty());
}

#[tokio::test]
async fn all_courses_lists_every_record() {
    let store = Arc::new(MemoryStore::new());
    let catalog = catalog(Arc::new(department_source()), store);
    assert!(catalog.all_courses().await.is_empty());

    catalog.courses_by_department(&dept_query("2026", "2")).await;
    let ids: Vec<String> = catalog.all_courses().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["202.1.0001", "202.1.0002", "202.1.0003"]);
}
