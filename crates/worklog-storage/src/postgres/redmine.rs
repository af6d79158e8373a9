use crate::error::{Result, StorageError};
use crate::models::{RedMineActivity, RedMineIssue, RedMineProject, WorkTimeEntry};

use super::PgStore;

impl PgStore {
    /// Idempotent upsert keyed on the external project id.
    pub(crate) fn upsert_project(&mut self, project: &RedMineProject) -> Result<bool> {
        let rows = self.client.execute(
            "INSERT INTO redmine_projects (id, name, description, closed)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                closed = excluded.closed",
            &[
                &project.id,
                &project.name,
                &project.description,
                &project.closed,
            ],
        )?;
        Ok(rows > 0)
    }

    pub(crate) fn upsert_activity(&mut self, activity: &RedMineActivity) -> Result<bool> {
        let rows = self.client.execute(
            "INSERT INTO redmine_activities (id, name) VALUES ($1, $2)
             ON CONFLICT (id) DO UPDATE SET name = excluded.name",
            &[&activity.id, &activity.name],
        )?;
        Ok(rows > 0)
    }

    pub(crate) fn upsert_issue(&mut self, issue: &RedMineIssue) -> Result<bool> {
        let rows = self.client.execute(
            "INSERT INTO redmine_issues
                (id, project_id, subject, assigned_to, description, closed)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                project_id = excluded.project_id,
                subject = excluded.subject,
                assigned_to = excluded.assigned_to,
                description = excluded.description,
                closed = excluded.closed",
            &[
                &issue.id,
                &issue.project_id,
                &issue.subject,
                &issue.assigned_to,
                &issue.description,
                &issue.closed,
            ],
        )?;
        Ok(rows > 0)
    }

    pub(crate) fn get_projects(&mut self) -> Result<Vec<RedMineProject>> {
        let rows = self.client.query(
            "SELECT id, name, description, closed FROM redmine_projects ORDER BY id ASC",
            &[],
        )?;
        Ok(rows
            .iter()
            .map(|row| RedMineProject {
                id: row.get(0),
                name: row.get(1),
                description: row.get(2),
                closed: row.get(3),
            })
            .collect())
    }

    pub(crate) fn get_activities(&mut self) -> Result<Vec<RedMineActivity>> {
        let rows = self.client.query(
            "SELECT id, name FROM redmine_activities ORDER BY id ASC",
            &[],
        )?;
        Ok(rows
            .iter()
            .map(|row| RedMineActivity {
                id: row.get(0),
                name: row.get(1),
            })
            .collect())
    }

    pub(crate) fn get_issues(&mut self) -> Result<Vec<RedMineIssue>> {
        let rows = self.client.query(
            "SELECT id, project_id, subject, assigned_to, description, closed
             FROM redmine_issues ORDER BY id ASC",
            &[],
        )?;
        Ok(rows
            .iter()
            .map(|row| RedMineIssue {
                id: row.get(0),
                project_id: row.get(1),
                subject: row.get(2),
                assigned_to: row.get(3),
                description: row.get(4),
                closed: row.get(5),
            })
            .collect())
    }

    /// Upsert keyed 1:1 on the work item id. A conflict replaces activity
    /// and issue but leaves an already-recorded `entry_id` alone.
    pub(crate) fn upsert_time_entry(&mut self, entry: &WorkTimeEntry) -> Result<bool> {
        if entry.work_id == 0 {
            return Err(StorageError::InvalidArgument("work item id"));
        }
        let rows = Self::rows_or_constraint(self.client.execute(
            "INSERT INTO redmine_time_entries (work_id, entry_id, activity_id, issue_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (work_id) DO UPDATE SET
                activity_id = excluded.activity_id,
                issue_id = excluded.issue_id",
            &[
                &entry.work_id,
                &entry.entry_id,
                &entry.activity_id,
                &entry.issue_id,
            ],
        ))?;
        Ok(rows > 0)
    }

    pub(crate) fn update_time_entry(&mut self, entry: &WorkTimeEntry) -> Result<bool> {
        let rows = self.client.execute(
            "UPDATE redmine_time_entries
             SET entry_id = $2, activity_id = $3, issue_id = $4
             WHERE work_id = $1",
            &[
                &entry.work_id,
                &entry.entry_id,
                &entry.activity_id,
                &entry.issue_id,
            ],
        )?;
        Ok(rows > 0)
    }

    pub(crate) fn get_time_entry(&mut self, work_id: i64) -> Result<Option<WorkTimeEntry>> {
        let row = self.client.query_opt(
            "SELECT work_id, entry_id, activity_id, issue_id
             FROM redmine_time_entries WHERE work_id = $1",
            &[&work_id],
        )?;
        Ok(row.map(|row| WorkTimeEntry {
            work_id: row.get(0),
            entry_id: row.get(1),
            activity_id: row.get(2),
            issue_id: row.get(3),
        }))
    }
}
