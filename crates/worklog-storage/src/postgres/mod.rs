//! PostgreSQL backend.
//!
//! Same contract as the SQLite backend with the dialect swapped: `$N`
//! placeholders, `BIGSERIAL` ids, `RETURNING` instead of last-insert-rowid,
//! native booleans. One blocking client per store instance.

mod items;
mod redmine;
mod schema;
mod stats;
mod tags;

use ::postgres::error::SqlState;
use ::postgres::{Client, NoTls};

use crate::config::PgConfig;
use crate::error::{Result, StorageError};
use crate::models::{
    RedMineActivity, RedMineIssue, RedMineProject, WorkItem, WorkTag, WorkTimeEntry,
};
use crate::store::WorkStore;

/// PostgreSQL-backed store.
pub struct PgStore {
    pub(crate) client: Client,
    tx_open: bool,
}

impl PgStore {
    /// Connect to the server named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn connect(config: &PgConfig) -> Result<Self> {
        let client = ::postgres::Config::new()
            .host(&config.host)
            .port(config.port)
            .dbname(&config.database)
            .user(&config.user)
            .password(&config.password)
            .connect(NoTls)?;
        log::info!(
            "connected to postgres database {} at {}:{}",
            config.database,
            config.host,
            config.port
        );
        Ok(Self {
            client,
            tx_open: false,
        })
    }

    /// Close the connection. Dropping the store has the same effect.
    pub fn close(self) {
        drop(self.client);
    }

    /// Map a constraint rejection to "zero rows affected"; any other
    /// failure stays an error.
    pub(crate) fn rows_or_constraint(
        result: std::result::Result<u64, ::postgres::Error>,
    ) -> Result<u64> {
        match result {
            Ok(rows) => Ok(rows),
            Err(e)
                if e.code().is_some_and(|code| {
                    *code == SqlState::FOREIGN_KEY_VIOLATION
                        || *code == SqlState::UNIQUE_VIOLATION
                }) =>
            {
                log::debug!("statement rejected by constraint: {e}");
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl WorkStore for PgStore {
    fn initialized(&mut self) -> Result<bool> {
        if let Err(e) = self.create_schema() {
            log::error!("postgres schema init failed: {e}");
            return Ok(false);
        }
        Ok(true)
    }

    fn keep_alive(&mut self) -> Result<bool> {
        match self.client.simple_query("SELECT 1") {
            Ok(_) => Ok(true),
            Err(e) => {
                log::debug!("postgres keep-alive failed: {e}");
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
        self.client.batch_execute("BEGIN")?;
        self.tx_open = true;
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<()> {
        // The handle is released no matter how the statement fares.
        self.tx_open = false;
        self.client.batch_execute("COMMIT")?;
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        self.tx_open = false;
        self.client.batch_execute("ROLLBACK")?;
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
