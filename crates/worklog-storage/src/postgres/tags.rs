use crate::error::Result;
use crate::models::{TagLevel, WorkTag};

use super::PgStore;

impl PgStore {
    /// Insert a new tag. A duplicate name is a no-op failure: the returned
    /// tag carries `id == 0`.
    pub(crate) fn insert_tag(&mut self, tag: &WorkTag) -> Result<WorkTag> {
        let row = self.client.query_opt(
            "INSERT INTO work_tags (name, color, level, disabled)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (name) DO NOTHING
             RETURNING id",
            &[&tag.name, &tag.color, &tag.level.as_i64(), &tag.disabled],
        )?;
        match row {
            Some(row) => Ok(WorkTag {
                id: row.get(0),
                ..tag.clone()
            }),
            None => {
                log::debug!("tag name already in use: {}", tag.name);
                Ok(WorkTag::default())
            }
        }
    }

    /// Update a tag in place; renaming onto an existing name is a no-op
    /// failure.
    pub(crate) fn update_tag(&mut self, tag: &WorkTag) -> Result<bool> {
        let rows = Self::rows_or_constraint(self.client.execute(
            "UPDATE work_tags SET name = $2, color = $3, level = $4, disabled = $5
             WHERE id = $1
               AND NOT EXISTS (SELECT 1 FROM work_tags WHERE name = $2 AND id <> $1)",
            &[
                &tag.id,
                &tag.name,
                &tag.color,
                &tag.level.as_i64(),
                &tag.disabled,
            ],
        ))?;
        Ok(rows > 0)
    }

    /// Delete a tag; association rows cascade away with it.
    pub(crate) fn delete_tag(&mut self, tag_id: i64) -> Result<bool> {
        let rows = self
            .client
            .execute("DELETE FROM work_tags WHERE id = $1", &[&tag_id])?;
        Ok(rows > 0)
    }

    /// All tags, disabled last, Primary before Secondary, then by id.
    pub(crate) fn get_all_tags(&mut self) -> Result<Vec<WorkTag>> {
        let rows = self.client.query(
            "SELECT id, name, color, level, disabled FROM work_tags
             ORDER BY disabled ASC, level ASC, id ASC",
            &[],
        )?;
        Ok(rows.iter().map(Self::row_to_tag).collect())
    }

    /// Rewrite a tag's id; fails (false) when the target id is taken.
    pub(crate) fn remap_tag_id(&mut self, from: i64, to: i64) -> Result<bool> {
        let rows = Self::rows_or_constraint(self.client.execute(
            "UPDATE work_tags SET id = $2 WHERE id = $1",
            &[&from, &to],
        ))?;
        Ok(rows > 0)
    }

    pub(crate) fn row_to_tag(row: &::postgres::Row) -> WorkTag {
        WorkTag {
            id: row.get(0),
            name: row.get(1),
            color: row.get(2),
            level: TagLevel::from_i64(row.get(3)),
            disabled: row.get(4),
        }
    }
}
