use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::migrate_legacy_database;
use crate::models::{Priority, RedMineIssue, RedMineProject, TagLevel};
use crate::sqlite::SqliteStore;
use crate::store::WorkStore;
use crate::tracker::IssueTracker;
use crate::version::{CURRENT_DATA_VERSION, LEGACY_DATA_VERSION};

struct FakeTracker {
    issues: HashMap<i64, RedMineIssue>,
    projects: HashMap<i64, RedMineProject>,
    fail_on_issue: Option<i64>,
}

impl FakeTracker {
    fn with_fixture() -> Self {
        let mut issues = HashMap::new();
        issues.insert(
            4711,
            RedMineIssue {
                id: 4711,
                project_id: 300,
                subject: "crash on save".to_string(),
                assigned_to: "li".to_string(),
                description: "reported by qa".to_string(),
                closed: false,
            },
        );
        issues.insert(
            4712,
            RedMineIssue {
                id: 4712,
                project_id: 300,
                subject: "slow startup".to_string(),
                assigned_to: "wang".to_string(),
                description: String::new(),
                closed: true,
            },
        );

        let mut projects = HashMap::new();
        projects.insert(
            300,
            RedMineProject {
                id: 300,
                name: "平台".to_string(),
                description: "main platform".to_string(),
                closed: false,
            },
        );

        Self {
            issues,
            projects,
            fail_on_issue: None,
        }
    }
}

impl IssueTracker for FakeTracker {
    fn fetch_issue(&self, issue_id: i64) -> anyhow::Result<RedMineIssue> {
        if self.fail_on_issue == Some(issue_id) {
            anyhow::bail!("network unreachable");
        }
        self.issues
            .get(&issue_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("issue {issue_id} not found"))
    }

    fn fetch_project(&self, project_id: i64) -> anyhow::Result<RedMineProject> {
        self.projects
            .get(&project_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("project {project_id} not found"))
    }
}

fn temp_db_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("worklog-import-{}-{name}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

fn write_legacy_db(path: &Path, version: i32) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE data_versions (version INTEGER NOT NULL);
         CREATE TABLE tags (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            color INTEGER NOT NULL,
            is_main INTEGER NOT NULL,
            hidden INTEGER NOT NULL
         );
         CREATE TABLE works (
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL,
            content TEXT NOT NULL,
            hours REAL NOT NULL,
            priority INTEGER NOT NULL,
            note TEXT,
            activity INTEGER NOT NULL DEFAULT 0,
            issue INTEGER NOT NULL DEFAULT 0,
            uploaded INTEGER NOT NULL DEFAULT 0
         );
         CREATE TABLE work_links (work_id INTEGER NOT NULL, tag_id INTEGER NOT NULL);
         CREATE TABLE activities (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE issues (id INTEGER PRIMARY KEY, subject TEXT);

         INSERT INTO data_versions (version) VALUES ({version});
         INSERT INTO tags VALUES (7, '项目甲', 16711680, 1, 0);
         INSERT INTO tags VALUES (9, '会议', 255, 0, 1);
         INSERT INTO works VALUES
            (3, '2025-01-01', 'feature work', 4.0, 1, 'design note', 9, 4711, 1);
         INSERT INTO works VALUES
            (5, '2025-01-02', 'meetings', 2.0, 2, NULL, 0, 0, 0);
         INSERT INTO works VALUES
            (8, '2025-01-03', 'bugfixing', 1.5, 0, NULL, 9, 4712, 1);
         INSERT INTO work_links VALUES (3, 7);
         INSERT INTO work_links VALUES (3, 9);
         INSERT INTO work_links VALUES (5, 7);
         INSERT INTO activities VALUES (9, 'Development');
         INSERT INTO issues VALUES (4711, 'stale subject');
         INSERT INTO issues VALUES (4712, 'stale subject two');"
    ))
    .unwrap();
}

fn store() -> SqliteStore {
    let mut store = SqliteStore::open_in_memory().unwrap();
    assert!(store.initialized().unwrap());
    store
}

#[test]
fn test_import_preserves_legacy_ids_and_fields() {
    let path = temp_db_path("preserve");
    write_legacy_db(&path, LEGACY_DATA_VERSION);
    let mut store = store();
    let tracker = FakeTracker::with_fixture();

    let mut events: Vec<(bool, f64, String)> = Vec::new();
    let ok = migrate_legacy_database(&mut store, &tracker, &path, &mut |ok, fraction, message| {
        events.push((ok, fraction, message.to_string()));
    });
    assert!(ok);
    let last = events.last().unwrap();
    assert!(last.0);
    assert!((last.1 - 1.0).abs() < 1e-9);

    // Tags keep their legacy ids, levels and hidden flags.
    let tags = store.all_work_tags().unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].id, 7);
    assert_eq!(tags[0].name, "项目甲");
    assert_eq!(tags[0].level, TagLevel::Primary);
    assert_eq!(tags[1].id, 9);
    assert!(tags[1].disabled);

    // Work items keep their legacy ids and fields.
    let item = store.get_work_item(3).unwrap().unwrap();
    assert_eq!(item.comment, "feature work");
    assert!((item.time - 4.0).abs() < 1e-9);
    let item = store.get_work_item(5).unwrap().unwrap();
    assert_eq!(item.priority, Priority::High);
    assert!(store.get_work_item(8).unwrap().is_some());

    // Note only where the legacy row had one.
    assert_eq!(store.work_get_note(3).unwrap().unwrap(), "design note");
    assert!(store.work_get_note(5).unwrap().is_none());

    // Associations, primary tag first.
    let tags = store.get_work_item_tags(3).unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].name, "项目甲");

    // Uploaded rows get synthesized positive entry ids, in row order.
    let entry = store.work_item_time_entry(3).unwrap().unwrap();
    assert_eq!(entry.activity_id, 9);
    assert_eq!(entry.issue_id, 4711);
    assert_eq!(entry.entry_id, 1);
    assert!(entry.was_uploaded());
    let entry = store.work_item_time_entry(8).unwrap().unwrap();
    assert_eq!(entry.entry_id, 2);
    assert!(store.work_item_time_entry(5).unwrap().is_none());

    // Mirrors are re-hydrated from the tracker, not the stale legacy rows.
    let issues = store.redmine_issues().unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].subject, "crash on save");
    assert!(issues[1].closed);
    let projects = store.redmine_projects().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "平台");
    let activities = store.redmine_activities().unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].name, "Development");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_failed_remote_fetch_rolls_back_everything() {
    let path = temp_db_path("rollback");
    write_legacy_db(&path, LEGACY_DATA_VERSION);
    let mut store = store();

    // Pre-existing destination state that must survive untouched.
    let kept_tag = store
        .create_work_tag(&crate::models::WorkTag::new("existing", 1, TagLevel::Primary))
        .unwrap();
    let kept_item = store
        .create_work_item(&crate::models::WorkItem::new("2024-11-11", "keep me", 7.0))
        .unwrap();
    assert!(store.work_update_note(kept_item.id, "old note").unwrap());

    let mut tracker = FakeTracker::with_fixture();
    tracker.fail_on_issue = Some(4712);

    let mut failures = 0;
    let ok = migrate_legacy_database(&mut store, &tracker, &path, &mut |ok, _, _| {
        if !ok {
            failures += 1;
        }
    });
    assert!(!ok);
    assert_eq!(failures, 1);

    // The destination is exactly the pre-import state.
    let tags = store.all_work_tags().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].id, kept_tag.id);
    assert_eq!(tags[0].name, "existing");
    let item = store.get_work_item(kept_item.id).unwrap().unwrap();
    assert_eq!(item.comment, "keep me");
    assert_eq!(store.work_get_note(kept_item.id).unwrap().unwrap(), "old note");
    assert!(store.redmine_issues().unwrap().is_empty());
    assert!(store.redmine_activities().unwrap().is_empty());
    assert!(store.get_work_item(3).unwrap().is_none());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_version_mismatch_aborts_before_any_write() {
    let path = temp_db_path("mismatch");
    write_legacy_db(&path, CURRENT_DATA_VERSION);
    let mut store = store();
    let tracker = FakeTracker::with_fixture();

    let kept = store
        .create_work_item(&crate::models::WorkItem::new("2024-12-24", "survivor", 1.0))
        .unwrap();

    let mut events: Vec<bool> = Vec::new();
    let ok = migrate_legacy_database(&mut store, &tracker, &path, &mut |ok, _, _| {
        events.push(ok);
    });
    assert!(!ok);
    assert_eq!(events, vec![false]);
    assert!(store.get_work_item(kept.id).unwrap().is_some());

    let _ = std::fs::remove_file(&path);
}
