use crate::error::{Result, StorageError};
use crate::models::{Priority, WorkItem, WorkTag};

use super::PgStore;

impl PgStore {
    pub(crate) fn insert_item(&mut self, item: &WorkItem) -> Result<WorkItem> {
        let row = self.client.query_one(
            "INSERT INTO work_items (create_date, comment, time, priority)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            &[
                &item.create_date,
                &item.comment,
                &item.time,
                &item.priority.as_i64(),
            ],
        )?;
        Ok(WorkItem {
            id: row.get(0),
            ..item.clone()
        })
    }

    pub(crate) fn update_item(&mut self, item: &WorkItem) -> Result<bool> {
        let rows = self.client.execute(
            "UPDATE work_items
             SET create_date = $2, comment = $3, time = $4, priority = $5
             WHERE id = $1",
            &[
                &item.id,
                &item.create_date,
                &item.comment,
                &item.time,
                &item.priority.as_i64(),
            ],
        )?;
        Ok(rows > 0)
    }

    /// Delete an item; its note, tag links and time entry cascade away.
    pub(crate) fn delete_item(&mut self, work_id: i64) -> Result<bool> {
        let rows = self
            .client
            .execute("DELETE FROM work_items WHERE id = $1", &[&work_id])?;
        Ok(rows > 0)
    }

    pub(crate) fn get_item(&mut self, work_id: i64) -> Result<Option<WorkItem>> {
        let row = self.client.query_opt(
            "SELECT id, create_date, comment, time, priority
             FROM work_items WHERE id = $1",
            &[&work_id],
        )?;
        Ok(row.as_ref().map(Self::row_to_item))
    }

    pub(crate) fn get_items_for_date(&mut self, date: &str) -> Result<Vec<WorkItem>> {
        let rows = self.client.query(
            "SELECT id, create_date, comment, time, priority
             FROM work_items WHERE create_date = $1 ORDER BY id ASC",
            &[&date],
        )?;
        Ok(rows.iter().map(Self::row_to_item).collect())
    }

    /// Upsert the 1:1 note; an empty note removes the row instead.
    pub(crate) fn upsert_note(&mut self, work_id: i64, note: &str) -> Result<bool> {
        if work_id == 0 {
            return Err(StorageError::InvalidArgument("work item id"));
        }
        if note.is_empty() {
            return self.delete_note(work_id);
        }
        let rows = Self::rows_or_constraint(self.client.execute(
            "INSERT INTO work_notes (work_id, note) VALUES ($1, $2)
             ON CONFLICT (work_id) DO UPDATE SET note = excluded.note",
            &[&work_id, &note],
        ))?;
        Ok(rows > 0)
    }

    pub(crate) fn delete_note(&mut self, work_id: i64) -> Result<bool> {
        if work_id == 0 {
            return Err(StorageError::InvalidArgument("work item id"));
        }
        let rows = self
            .client
            .execute("DELETE FROM work_notes WHERE work_id = $1", &[&work_id])?;
        Ok(rows > 0)
    }

    pub(crate) fn get_note(&mut self, work_id: i64) -> Result<Option<String>> {
        let row = self.client.query_opt(
            "SELECT note FROM work_notes WHERE work_id = $1",
            &[&work_id],
        )?;
        Ok(row.map(|row| row.get(0)))
    }

    pub(crate) fn insert_item_tag(&mut self, work_id: i64, tag_id: i64) -> Result<bool> {
        if work_id == 0 {
            return Err(StorageError::InvalidArgument("work item id"));
        }
        if tag_id == 0 {
            return Err(StorageError::InvalidArgument("work tag id"));
        }
        let rows = Self::rows_or_constraint(self.client.execute(
            "INSERT INTO work_item_tags (work_id, tag_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
            &[&work_id, &tag_id],
        ))?;
        Ok(rows > 0)
    }

    pub(crate) fn delete_item_tag(&mut self, work_id: i64, tag_id: i64) -> Result<bool> {
        let rows = self.client.execute(
            "DELETE FROM work_item_tags WHERE work_id = $1 AND tag_id = $2",
            &[&work_id, &tag_id],
        )?;
        Ok(rows > 0)
    }

    /// Tags of one item, level ascending, so the first entry is the
    /// Primary tag by convention.
    pub(crate) fn get_item_tags(&mut self, work_id: i64) -> Result<Vec<WorkTag>> {
        let rows = self.client.query(
            "SELECT t.id, t.name, t.color, t.level, t.disabled
             FROM work_item_tags l
             JOIN work_tags t ON t.id = l.tag_id
             WHERE l.work_id = $1
             ORDER BY t.level ASC, t.id ASC",
            &[&work_id],
        )?;
        Ok(rows.iter().map(Self::row_to_tag).collect())
    }

    /// Rewrite an item's id; fails (false) when the target id is taken.
    pub(crate) fn remap_item_id(&mut self, from: i64, to: i64) -> Result<bool> {
        let rows = Self::rows_or_constraint(self.client.execute(
            "UPDATE work_items SET id = $2 WHERE id = $1",
            &[&from, &to],
        ))?;
        Ok(rows > 0)
    }

    pub(crate) fn row_to_item(row: &::postgres::Row) -> WorkItem {
        WorkItem {
            id: row.get(0),
            create_date: row.get(1),
            comment: row.get(2),
            time: row.get(3),
            priority: Priority::from_i64(row.get(4)),
        }
    }
}
