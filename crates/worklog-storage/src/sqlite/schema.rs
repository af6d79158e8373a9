use rusqlite::params;

use crate::error::Result;
use crate::version::{DataVersion, CURRENT_DATA_VERSION};

use super::SqliteStore;

impl SqliteStore {
    /// Create every table of the current schema and seed the data version.
    /// Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if table creation or version seeding fails.
    pub(crate) fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS work_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                color INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 0,
                disabled INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS work_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                create_date TEXT NOT NULL,
                comment TEXT NOT NULL DEFAULT '',
                time REAL NOT NULL DEFAULT 0,
                priority INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS work_notes (
                work_id INTEGER PRIMARY KEY
                    REFERENCES work_items(id) ON DELETE CASCADE,
                note TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS work_item_tags (
                work_id INTEGER NOT NULL
                    REFERENCES work_items(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL
                    REFERENCES work_tags(id) ON DELETE CASCADE,
                PRIMARY KEY (work_id, tag_id)
            );

            CREATE TABLE IF NOT EXISTS redmine_projects (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                closed INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS redmine_activities (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS redmine_issues (
                id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL DEFAULT 0,
                subject TEXT NOT NULL DEFAULT '',
                assigned_to TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                closed INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS redmine_time_entries (
                work_id INTEGER PRIMARY KEY
                    REFERENCES work_items(id) ON DELETE CASCADE,
                entry_id INTEGER NOT NULL DEFAULT 0,
                activity_id INTEGER NOT NULL DEFAULT 0,
                issue_id INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS data_versions (
                version INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_work_items_create_date
                ON work_items(create_date);
            CREATE INDEX IF NOT EXISTS idx_work_item_tags_tag
                ON work_item_tags(tag_id);",
        )?;

        self.conn.execute(
            "INSERT INTO data_versions (version)
             SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM data_versions)",
            params![CURRENT_DATA_VERSION],
        )?;

        log::info!("sqlite schema initialized");
        Ok(())
    }

    pub(crate) fn read_data_version(&self) -> Result<i32> {
        let version: Option<i32> =
            self.conn
                .query_row("SELECT MAX(version) FROM data_versions", [], |row| {
                    row.get(0)
                })?;
        Ok(version.unwrap_or(0))
    }

    /// One migration step per from-version; the step updates the version
    /// row itself.
    pub(crate) fn apply_upgrade_step(&mut self, from: i32) -> Result<bool> {
        if from == DataVersion::new(1, 0, 0).pack() {
            self.conn.execute_batch(
                "ALTER TABLE work_tags ADD COLUMN disabled INTEGER NOT NULL DEFAULT 0",
            )?;
            self.bump_version(from, DataVersion::new(1, 0, 1).pack())?;
            return Ok(true);
        }
        if from == DataVersion::new(1, 0, 1).pack() {
            self.conn.execute_batch(
                "ALTER TABLE redmine_projects ADD COLUMN closed INTEGER NOT NULL DEFAULT 0",
            )?;
            self.bump_version(from, CURRENT_DATA_VERSION)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn bump_version(&self, from: i32, to: i32) -> Result<()> {
        self.conn.execute(
            "UPDATE data_versions SET version = ?2 WHERE version = ?1",
            params![from, to],
        )?;
        Ok(())
    }

    /// Delete everything, leaf tables first so no cascade ordering issues
    /// arise. The version table stays.
    pub(crate) fn purge_tables(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM work_item_tags;
             DELETE FROM work_notes;
             DELETE FROM redmine_time_entries;
             DELETE FROM work_items;
             DELETE FROM work_tags;
             DELETE FROM redmine_issues;
             DELETE FROM redmine_activities;
             DELETE FROM redmine_projects;",
        )?;
        log::info!("all data tables cleared");
        Ok(())
    }
}
