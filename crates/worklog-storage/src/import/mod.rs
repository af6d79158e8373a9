//! One-shot migration from the legacy database into the current schema.
//!
//! The import preserves original numeric identifiers: where the destination
//! backend auto-assigns a different id, the row is remapped back to the
//! legacy value. The whole run straddles one storage-level transaction, so
//! a failure at any step leaves the destination exactly as it was.

mod legacy;
#[cfg(test)]
mod tests;

pub use legacy::{LegacyDatabase, LegacyTag, LegacyWork};

use anyhow::Context;
use std::path::Path;

use crate::models::{Priority, RedMineActivity, TagLevel, WorkItem, WorkTag, WorkTimeEntry};
use crate::store::WorkStore;
use crate::tracker::IssueTracker;
use crate::version::{DataVersion, LEGACY_DATA_VERSION};

/// Progress reporting channel: `(ok, fraction in [0, 1], message)`. The
/// first `ok = false` call is also the last; the import is already rolled
/// back when it fires.
pub type ProgressFn<'a> = dyn FnMut(bool, f64, &str) + 'a;

/// Import `legacy_path` into `store`, reporting progress along the way.
///
/// Returns `true` only when every step succeeded and the transaction
/// committed. On any failure the destination database is rolled back in
/// full; no partial import is ever observable.
pub fn migrate_legacy_database(
    store: &mut dyn WorkStore,
    tracker: &dyn IssueTracker,
    legacy_path: &Path,
    progress: &mut ProgressFn<'_>,
) -> bool {
    let legacy = match LegacyDatabase::open(legacy_path) {
        Ok(db) => db,
        Err(e) => {
            progress(false, 0.0, &format!("cannot open legacy database: {e}"));
            return false;
        }
    };

    match legacy.version() {
        Ok(version) if version == LEGACY_DATA_VERSION => {}
        Ok(version) => {
            progress(
                false,
                0.0,
                &format!(
                    "unexpected legacy version {} (need {})",
                    DataVersion::unpack(version),
                    DataVersion::unpack(LEGACY_DATA_VERSION)
                ),
            );
            return false;
        }
        Err(e) => {
            progress(false, 0.0, &format!("cannot read legacy version: {e}"));
            return false;
        }
    }
    progress(true, 0.1, "legacy database verified");

    if let Err(e) = store.begin_transaction() {
        progress(false, 0.1, &format!("cannot open transaction: {e}"));
        return false;
    }

    match run_import(store, tracker, &legacy, progress) {
        Ok(()) => {
            if let Err(e) = store.commit_transaction() {
                progress(false, 1.0, &format!("commit failed: {e}"));
                return false;
            }
            log::info!("legacy import committed");
            progress(true, 1.0, "import complete");
            true
        }
        Err(e) => {
            let _ = store.rollback_transaction();
            log::warn!("legacy import rolled back: {e:#}");
            progress(false, 1.0, &format!("import failed, rolled back: {e:#}"));
            false
        }
    }
}

fn run_import(
    store: &mut dyn WorkStore,
    tracker: &dyn IssueTracker,
    legacy: &LegacyDatabase,
    progress: &mut ProgressFn<'_>,
) -> anyhow::Result<()> {
    store.purge_all_data()?;
    progress(true, 0.2, "destination tables cleared");

    // Activities keep their external ids; a plain upsert is enough.
    for (id, name) in legacy.activities()? {
        store.add_redmine_activity(&RedMineActivity { id, name })?;
    }
    progress(true, 0.3, "activities imported");

    import_issues(store, tracker, legacy, progress)?;

    import_tags(store, legacy)?;
    progress(true, 0.6, "tags imported");

    import_works(store, legacy)?;
    progress(true, 0.8, "work items imported");

    // Ids now match the legacy ones, so the pairs copy over directly.
    for (work_id, tag_id) in legacy.links()? {
        if !store.add_work_item_tag(work_id, tag_id)? {
            anyhow::bail!("dangling legacy link {work_id} -> {tag_id}");
        }
    }
    progress(true, 0.9, "tag links imported");

    Ok(())
}

/// Issues are re-hydrated from the live tracker; the project is upserted
/// before its issue to keep referential order.
fn import_issues(
    store: &mut dyn WorkStore,
    tracker: &dyn IssueTracker,
    legacy: &LegacyDatabase,
    progress: &mut ProgressFn<'_>,
) -> anyhow::Result<()> {
    let issue_ids = legacy.issue_ids()?;
    let count = issue_ids.len();
    for (index, issue_id) in issue_ids.into_iter().enumerate() {
        let issue = tracker
            .fetch_issue(issue_id)
            .with_context(|| format!("fetch issue {issue_id}"))?;
        let project = tracker
            .fetch_project(issue.project_id)
            .with_context(|| format!("fetch project {}", issue.project_id))?;
        store.add_redmine_project(&project)?;
        store.add_redmine_issue(&issue)?;

        #[allow(clippy::cast_precision_loss)]
        let fraction = 0.3 + 0.2 * ((index + 1) as f64 / count as f64);
        progress(true, fraction, &format!("issue {issue_id} refreshed"));
    }
    Ok(())
}

fn import_tags(store: &mut dyn WorkStore, legacy: &LegacyDatabase) -> anyhow::Result<()> {
    for tag in legacy.tags()? {
        let level = if tag.is_main {
            TagLevel::Primary
        } else {
            TagLevel::Secondary
        };
        let mut fresh = WorkTag::new(tag.name.clone(), tag.color, level);
        fresh.disabled = tag.hidden;

        let created = store.create_work_tag(&fresh)?;
        if created.id == 0 {
            anyhow::bail!("duplicate tag name in legacy data: {}", tag.name);
        }
        if created.id != tag.id && !store.update_work_tag_id(created.id, tag.id)? {
            anyhow::bail!("cannot restore legacy id {} for tag {}", tag.id, tag.name);
        }
    }
    Ok(())
}

fn import_works(store: &mut dyn WorkStore, legacy: &LegacyDatabase) -> anyhow::Result<()> {
    // Legacy rows flagged uploaded carry no remote entry id; a synthesized
    // positive id keeps the uploaded marker. Lossy: these dummies are
    // indistinguishable from genuine remote ids afterwards.
    let mut synthesized_entry_id = 0_i64;

    for work in legacy.works()? {
        let mut item = WorkItem::new(work.date.clone(), work.content.clone(), work.hours);
        item.priority = Priority::from_i64(work.priority);

        let created = store.create_work_item(&item)?;
        if created.id == 0 {
            anyhow::bail!("cannot insert legacy work item {}", work.id);
        }
        if created.id != work.id && !store.update_work_item_id(created.id, work.id)? {
            anyhow::bail!("cannot restore legacy id {} for work item", work.id);
        }

        if let Some(note) = &work.note {
            if !note.is_empty() && !store.work_update_note(work.id, note)? {
                anyhow::bail!("cannot attach note to work item {}", work.id);
            }
        }

        if work.activity_id > 0 || work.issue_id > 0 {
            let mut entry = WorkTimeEntry::new(work.id, work.activity_id, work.issue_id);
            if !store.create_work_time_entry(&entry)? {
                anyhow::bail!("cannot attach time entry to work item {}", work.id);
            }
            if work.uploaded {
                synthesized_entry_id += 1;
                entry.entry_id = synthesized_entry_id;
                if !store.update_work_time_entry(&entry)? {
                    anyhow::bail!("cannot mark work item {} as uploaded", work.id);
                }
            }
        }
    }
    Ok(())
}
