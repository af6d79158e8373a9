//! The storage contract every backend implements.

use crate::error::Result;
use crate::models::{
    RedMineActivity, RedMineIssue, RedMineProject, StatisticsResult, WorkItem, WorkTag,
    WorkTimeEntry,
};
use crate::{migrate, stats};

/// Backend-agnostic persistence contract.
///
/// Exactly one active instance owns the physical connection; every call is
/// synchronous and blocking, and callers are responsible for offloading onto
/// worker threads. Entities returned are detached value copies.
///
/// Behavioral rules every implementation must honor, not just one:
///
/// - [`create_work_tag`](Self::create_work_tag) with a duplicate name is a
///   no-op failure returning a default tag with `id == 0`.
/// - [`all_work_tags`](Self::all_work_tags) orders disabled-last, then by
///   level (Primary before Secondary), then by id. The UI grouping and the
///   two-level statistics split rely on this order.
/// - [`get_work_item_tags`](Self::get_work_item_tags) orders by level
///   ascending so the first tag of an item is its Primary tag. At most one
///   Primary tag per item is a caller convention; the contract does not
///   enforce the cardinality.
/// - RedMine mirror upserts are idempotent, keyed on the external id.
/// - [`create_work_time_entry`](Self::create_work_time_entry) upserts 1:1 on
///   the work item id, replacing activity/issue on conflict and leaving an
///   already-recorded `entry_id` alone.
/// - Mutating calls report "zero rows affected" as `Ok(false)`; calls that
///   require a persisted parent fail fast with
///   [`StorageError::InvalidArgument`](crate::StorageError::InvalidArgument)
///   naming the missing identifier.
pub trait WorkStore {
    // ---- lifecycle ----

    /// Idempotent schema bootstrap; creates every table and seeds the
    /// initial packed data version when absent. Returns `false` when the
    /// schema cannot be created.
    fn initialized(&mut self) -> Result<bool>;

    /// Lightweight liveness probe.
    fn keep_alive(&mut self) -> Result<bool>;

    // ---- version control ----

    /// The authoritative packed schema version (table maximum).
    fn data_version(&mut self) -> Result<i32>;

    /// Apply the single migration step whose from-version equals `from`.
    /// The step's own statements must advance the version row. Returns
    /// `false` when no step starts at `from`.
    fn upgrade_step(&mut self, from: i32) -> Result<bool>;

    /// Walk migration steps one version at a time until the stored version
    /// equals `target`. On failure the version is left unchanged, never at
    /// an intermediate value.
    fn update_tables(&mut self, target: i32) -> Result<bool> {
        migrate::run(self, target)
    }

    // ---- tags ----

    fn create_work_tag(&mut self, tag: &WorkTag) -> Result<WorkTag>;
    fn update_work_tag(&mut self, tag: &WorkTag) -> Result<bool>;
    fn delete_work_tag(&mut self, tag_id: i64) -> Result<bool>;
    fn all_work_tags(&mut self) -> Result<Vec<WorkTag>>;

    // ---- work items ----

    fn create_work_item(&mut self, item: &WorkItem) -> Result<WorkItem>;
    fn update_work_item(&mut self, item: &WorkItem) -> Result<bool>;
    fn delete_work_item(&mut self, work_id: i64) -> Result<bool>;
    fn get_work_item(&mut self, work_id: i64) -> Result<Option<WorkItem>>;
    fn work_items_for_date(&mut self, date: &str) -> Result<Vec<WorkItem>>;

    // ---- notes ----

    /// Upsert the 1:1 note of a work item; an empty note removes the row.
    fn work_update_note(&mut self, work_id: i64, note: &str) -> Result<bool>;
    fn work_delete_note(&mut self, work_id: i64) -> Result<bool>;
    fn work_get_note(&mut self, work_id: i64) -> Result<Option<String>>;

    // ---- item/tag associations ----

    fn add_work_item_tag(&mut self, work_id: i64, tag_id: i64) -> Result<bool>;
    fn remove_work_item_tag(&mut self, work_id: i64, tag_id: i64) -> Result<bool>;
    fn get_work_item_tags(&mut self, work_id: i64) -> Result<Vec<WorkTag>>;

    // ---- RedMine mirrors ----

    fn add_redmine_project(&mut self, project: &RedMineProject) -> Result<bool>;
    fn add_redmine_activity(&mut self, activity: &RedMineActivity) -> Result<bool>;
    fn add_redmine_issue(&mut self, issue: &RedMineIssue) -> Result<bool>;
    fn redmine_projects(&mut self) -> Result<Vec<RedMineProject>>;
    fn redmine_activities(&mut self) -> Result<Vec<RedMineActivity>>;
    fn redmine_issues(&mut self) -> Result<Vec<RedMineIssue>>;

    // ---- time entries ----

    fn create_work_time_entry(&mut self, entry: &WorkTimeEntry) -> Result<bool>;
    fn update_work_time_entry(&mut self, entry: &WorkTimeEntry) -> Result<bool>;
    fn work_item_time_entry(&mut self, work_id: i64) -> Result<Option<WorkTimeEntry>>;

    // ---- statistics ----

    /// Sum of hours over every work item whose date falls in the inclusive
    /// range, tagged or not.
    fn range_total_hours(&mut self, begin: &str, end: &str) -> Result<f64>;

    /// Sum of hours over work items in range carrying the given tag.
    fn range_tag_hours(&mut self, tag_id: i64, begin: &str, end: &str) -> Result<f64>;

    /// Secondary-tag breakdown beneath one primary tag: `(tag id, name,
    /// hours)` rows from the association-table self-join.
    fn range_secondary_tag_hours(
        &mut self,
        primary_tag_id: i64,
        begin: &str,
        end: &str,
    ) -> Result<Vec<(i64, String, f64)>>;

    /// Two-level tag-time rollup over the inclusive date range.
    fn tag_statistics(&mut self, begin: &str, end: &str) -> Result<StatisticsResult> {
        stats::collect(self, begin, end)
    }

    // ---- transaction control ----

    /// Open a transaction. At most one may be active per connection; a
    /// second `begin_transaction` is a precondition violation.
    fn begin_transaction(&mut self) -> Result<()>;
    fn commit_transaction(&mut self) -> Result<()>;
    fn rollback_transaction(&mut self) -> Result<()>;

    // ---- legacy-importer support ----

    /// Rewrite a work item's id, realigning auto-increment drift with the
    /// legacy id. Used only by the importer.
    fn update_work_item_id(&mut self, from: i64, to: i64) -> Result<bool>;

    /// Rewrite a work tag's id. Used only by the importer.
    fn update_work_tag_id(&mut self, from: i64, to: i64) -> Result<bool>;

    /// Wipe every data table, leaf tables first. Destructive; the importer
    /// calls this inside its all-or-nothing transaction.
    fn purge_all_data(&mut self) -> Result<()>;
}
