use crate::error::Result;
use crate::version::{DataVersion, CURRENT_DATA_VERSION};

use super::PgStore;

impl PgStore {
    /// Create every table of the current schema and seed the data version.
    /// Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if table creation or version seeding fails.
    pub(crate) fn create_schema(&mut self) -> Result<()> {
        self.client.batch_execute(
            "CREATE TABLE IF NOT EXISTS work_tags (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                color INTEGER NOT NULL DEFAULT 0,
                level BIGINT NOT NULL DEFAULT 0,
                disabled BOOLEAN NOT NULL DEFAULT FALSE
            );

            CREATE TABLE IF NOT EXISTS work_items (
                id BIGSERIAL PRIMARY KEY,
                create_date TEXT NOT NULL,
                comment TEXT NOT NULL DEFAULT '',
                time DOUBLE PRECISION NOT NULL DEFAULT 0,
                priority BIGINT NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS work_notes (
                work_id BIGINT PRIMARY KEY
                    REFERENCES work_items(id) ON DELETE CASCADE,
                note TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS work_item_tags (
                work_id BIGINT NOT NULL
                    REFERENCES work_items(id) ON DELETE CASCADE,
                tag_id BIGINT NOT NULL
                    REFERENCES work_tags(id) ON DELETE CASCADE,
                PRIMARY KEY (work_id, tag_id)
            );

            CREATE TABLE IF NOT EXISTS redmine_projects (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                closed BOOLEAN NOT NULL DEFAULT FALSE
            );

            CREATE TABLE IF NOT EXISTS redmine_activities (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS redmine_issues (
                id BIGINT PRIMARY KEY,
                project_id BIGINT NOT NULL DEFAULT 0,
                subject TEXT NOT NULL DEFAULT '',
                assigned_to TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                closed BOOLEAN NOT NULL DEFAULT FALSE
            );

            CREATE TABLE IF NOT EXISTS redmine_time_entries (
                work_id BIGINT PRIMARY KEY
                    REFERENCES work_items(id) ON DELETE CASCADE,
                entry_id BIGINT NOT NULL DEFAULT 0,
                activity_id BIGINT NOT NULL DEFAULT 0,
                issue_id BIGINT NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS data_versions (
                version INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_work_items_create_date
                ON work_items(create_date);
            CREATE INDEX IF NOT EXISTS idx_work_item_tags_tag
                ON work_item_tags(tag_id);",
        )?;

        self.client.execute(
            "INSERT INTO data_versions (version)
             SELECT $1 WHERE NOT EXISTS (SELECT 1 FROM data_versions)",
            &[&CURRENT_DATA_VERSION],
        )?;

        log::info!("postgres schema initialized");
        Ok(())
    }

    pub(crate) fn read_data_version(&mut self) -> Result<i32> {
        let row = self
            .client
            .query_one("SELECT MAX(version) FROM data_versions", &[])?;
        let version: Option<i32> = row.get(0);
        Ok(version.unwrap_or(0))
    }

    /// One migration step per from-version; the step updates the version
    /// row itself.
    pub(crate) fn apply_upgrade_step(&mut self, from: i32) -> Result<bool> {
        if from == DataVersion::new(1, 0, 0).pack() {
            self.client.batch_execute(
                "ALTER TABLE work_tags
                 ADD COLUMN disabled BOOLEAN NOT NULL DEFAULT FALSE",
            )?;
            self.bump_version(from, DataVersion::new(1, 0, 1).pack())?;
            return Ok(true);
        }
        if from == DataVersion::new(1, 0, 1).pack() {
            self.client.batch_execute(
                "ALTER TABLE redmine_projects
                 ADD COLUMN closed BOOLEAN NOT NULL DEFAULT FALSE",
            )?;
            self.bump_version(from, CURRENT_DATA_VERSION)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn bump_version(&mut self, from: i32, to: i32) -> Result<()> {
        self.client.execute(
            "UPDATE data_versions SET version = $2 WHERE version = $1",
            &[&from, &to],
        )?;
        Ok(())
    }

    /// Delete everything, leaf tables first. The version table stays.
    pub(crate) fn purge_tables(&mut self) -> Result<()> {
        self.client.batch_execute(
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
