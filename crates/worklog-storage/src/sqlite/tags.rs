use rusqlite::params;

use crate::error::Result;
use crate::models::{TagLevel, WorkTag};

use super::SqliteStore;

impl SqliteStore {
    /// Insert a new tag. A duplicate name is a no-op failure: the returned
    /// tag carries `id == 0`.
    pub(crate) fn insert_tag(&mut self, tag: &WorkTag) -> Result<WorkTag> {
        let inserted = Self::rows_or_constraint(self.conn.execute(
            "INSERT OR IGNORE INTO work_tags (name, color, level, disabled)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                tag.name,
                tag.color,
                tag.level.as_i64(),
                i64::from(tag.disabled)
            ],
        ))?;
        if inserted == 0 {
            log::debug!("tag name already in use: {}", tag.name);
            return Ok(WorkTag::default());
        }
        Ok(WorkTag {
            id: self.conn.last_insert_rowid(),
            ..tag.clone()
        })
    }

    /// Update a tag in place; renaming onto an existing name is a no-op
    /// failure.
    pub(crate) fn update_tag(&mut self, tag: &WorkTag) -> Result<bool> {
        let rows = Self::rows_or_constraint(self.conn.execute(
            "UPDATE work_tags SET name = ?2, color = ?3, level = ?4, disabled = ?5
             WHERE id = ?1
               AND NOT EXISTS (SELECT 1 FROM work_tags WHERE name = ?2 AND id <> ?1)",
            params![
                tag.id,
                tag.name,
                tag.color,
                tag.level.as_i64(),
                i64::from(tag.disabled)
            ],
        ))?;
        Ok(rows > 0)
    }

    /// Delete a tag; association rows cascade away with it.
    pub(crate) fn delete_tag(&mut self, tag_id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM work_tags WHERE id = ?1", params![tag_id])?;
        Ok(rows > 0)
    }

    /// All tags, disabled last, Primary before Secondary, then by id. The
    /// UI grouping and the statistics split rely on this order.
    pub(crate) fn get_all_tags(&mut self) -> Result<Vec<WorkTag>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, level, disabled FROM work_tags
             ORDER BY disabled ASC, level ASC, id ASC",
        )?;
        let tags = stmt
            .query_map([], Self::row_to_tag)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    /// Rewrite a tag's id; fails (false) when the target id is taken.
    pub(crate) fn remap_tag_id(&mut self, from: i64, to: i64) -> Result<bool> {
        let rows = Self::rows_or_constraint(self.conn.execute(
            "UPDATE work_tags SET id = ?2 WHERE id = ?1",
            params![from, to],
        ))?;
        Ok(rows > 0)
    }

    pub(crate) fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<WorkTag> {
        Ok(WorkTag {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            level: TagLevel::from_i64(row.get(3)?),
            disabled: row.get::<_, i64>(4)? != 0,
        })
    }
}
