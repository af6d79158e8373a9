//! SQLite backend.
//!
//! Statements use `?N` placeholders, ids come from `AUTOINCREMENT`, and
//! cascading deletes require `PRAGMA foreign_keys = ON` on every connection.
//! Operations are split into domain-specific modules.

mod items;
mod redmine;
mod schema;
mod stats;
mod tags;

use rusqlite::Connection;

use crate::config::SqliteConfig;
use crate::error::{Result, StorageError};
use crate::models::{
    RedMineActivity, RedMineIssue, RedMineProject, WorkItem, WorkTag, WorkTimeEntry,
};
use crate::store::WorkStore;

/// SQLite-backed store. Owns the single connection and the one-at-a-time
/// transaction flag.
pub struct SqliteStore {
    pub(crate) conn: Connection,
    tx_open: bool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// connection cannot be opened.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&config.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        log::info!("opened sqlite database at {}", config.path.display());
        Ok(Self {
            conn,
            tx_open: false,
        })
    }

    /// Open a throwaway in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(Self {
            conn,
            tx_open: false,
        })
    }

    /// Close the connection, releasing the file handle. Dropping the store
    /// has the same effect.
    ///
    /// # Errors
    ///
    /// Returns an error if sqlite cannot finalize the connection.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    /// Map a constraint rejection to "zero rows affected"; any other
    /// failure stays an error.
    pub(crate) fn rows_or_constraint(result: rusqlite::Result<usize>) -> Result<usize> {
        match result {
            Ok(rows) => Ok(rows),
            Err(rusqlite::Error::SqliteFailure(e, message))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                log::debug!("statement rejected by constraint: {message:?}");
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl WorkStore for SqliteStore {
    fn initialized(&mut self) -> Result<bool> {
        if let Err(e) = self.create_schema() {
            log::error!("sqlite schema init failed: {e}");
            return Ok(false);
        }
        Ok(true)
    }

    fn keep_alive(&mut self) -> Result<bool> {
        match self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
            Ok(_) => Ok(true),
            Err(e) => {
                log::debug!("sqlite keep-alive failed: {e}");
                Ok(false)
            }
        }
    }

    fn data_version(&mut self) -> Result<i32> {
        self.read_data_version()
    }

    fn upgrade_step(&mut self, from: i32) -> Result<bool> {
        self.apply_upgrade_step(from)
    }

    fn create_work_tag(&mut self, tag: &WorkTag) -> Result<WorkTag> {
        self.insert_tag(tag)
    }

    fn update_work_tag(&mut self, tag: &WorkTag) -> Result<bool> {
        self.update_tag(tag)
    }

    fn delete_work_tag(&mut self, tag_id: i64) -> Result<bool> {
        self.delete_tag(tag_id)
    }

    fn all_work_tags(&mut self) -> Result<Vec<WorkTag>> {
        self.get_all_tags()
    }

    fn create_work_item(&mut self, item: &WorkItem) -> Result<WorkItem> {
        self.insert_item(item)
    }

    fn update_work_item(&mut self, item: &WorkItem) -> Result<bool> {
        self.update_item(item)
    }

    fn delete_work_item(&mut self, work_id: i64) -> Result<bool> {
        self.delete_item(work_id)
    }

    fn get_work_item(&mut self, work_id: i64) -> Result<Option<WorkItem>> {
        self.get_item(work_id)
    }

    fn work_items_for_date(&mut self, date: &str) -> Result<Vec<WorkItem>> {
        self.get_items_for_date(date)
    }

    fn work_update_note(&mut self, work_id: i64, note: &str) -> Result<bool> {
        self.upsert_note(work_id, note)
    }

    fn work_delete_note(&mut self, work_id: i64) -> Result<bool> {
        self.delete_note(work_id)
    }

    fn work_get_note(&mut self, work_id: i64) -> Result<Option<String>> {
        self.get_note(work_id)
    }

    fn add_work_item_tag(&mut self, work_id: i64, tag_id: i64) -> Result<bool> {
        self.insert_item_tag(work_id, tag_id)
    }

    fn remove_work_item_tag(&mut self, work_id: i64, tag_id: i64) -> Result<bool> {
        self.delete_item_tag(work_id, tag_id)
    }

    fn get_work_item_tags(&mut self, work_id: i64) -> Result<Vec<WorkTag>> {
        self.get_item_tags(work_id)
    }

    fn add_redmine_project(&mut self, project: &RedMineProject) -> Result<bool> {
        self.upsert_project(project)
    }

    fn add_redmine_activity(&mut self, activity: &RedMineActivity) -> Result<bool> {
        self.upsert_activity(activity)
    }

    fn add_redmine_issue(&mut self, issue: &RedMineIssue) -> Result<bool> {
        self.upsert_issue(issue)
    }

    fn redmine_projects(&mut self) -> Result<Vec<RedMineProject>> {
        self.get_projects()
    }

    fn redmine_activities(&mut self) -> Result<Vec<RedMineActivity>> {
        self.get_activities()
    }

    fn redmine_issues(&mut self) -> Result<Vec<RedMineIssue>> {
        self.get_issues()
    }

    fn create_work_time_entry(&mut self, entry: &WorkTimeEntry) -> Result<bool> {
        self.upsert_time_entry(entry)
    }

    fn update_work_time_entry(&mut self, entry: &WorkTimeEntry) -> Result<bool> {
        self.update_time_entry(entry)
    }

    fn work_item_time_entry(&mut self, work_id: i64) -> Result<Option<WorkTimeEntry>> {
        self.get_time_entry(work_id)
    }

    fn range_total_hours(&mut self, begin: &str, end: &str) -> Result<f64> {
        self.sum_range_hours(begin, end)
    }

    fn range_tag_hours(&mut self, tag_id: i64, begin: &str, end: &str) -> Result<f64> {
        self.sum_tag_hours(tag_id, begin, end)
    }

    fn range_secondary_tag_hours(
        &mut self,
        primary_tag_id: i64,
        begin: &str,
        end: &str,
    ) -> Result<Vec<(i64, String, f64)>> {
        self.sum_secondary_hours(primary_tag_id, begin, end)
    }

    fn begin_transaction(&mut self) -> Result<()> {
        if self.tx_open {
            return Err(StorageError::InvalidArgument("transaction already open"));
        }
        self.conn.execute_batch("BEGIN")?;
        self.tx_open = true;
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<()> {
        // The handle is released no matter how the statement fares.
        self.tx_open = false;
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        self.tx_open = false;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn update_work_item_id(&mut self, from: i64, to: i64) -> Result<bool> {
        self.remap_item_id(from, to)
    }

    fn update_work_tag_id(&mut self, from: i64, to: i64) -> Result<bool> {
        self.remap_tag_id(from, to)
    }

    fn purge_all_data(&mut self) -> Result<()> {
        self.purge_tables()
    }
}
