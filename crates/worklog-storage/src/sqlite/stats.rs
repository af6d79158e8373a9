use rusqlite::params;

use crate::error::Result;

use super::SqliteStore;

impl SqliteStore {
    pub(crate) fn sum_range_hours(&mut self, begin: &str, end: &str) -> Result<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(time), 0.0) FROM work_items
             WHERE create_date BETWEEN ?1 AND ?2",
            params![begin, end],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    pub(crate) fn sum_tag_hours(&mut self, tag_id: i64, begin: &str, end: &str) -> Result<f64> {
        let hours = self.conn.query_row(
            "SELECT COALESCE(SUM(w.time), 0.0)
             FROM work_items w
             JOIN work_item_tags l ON l.work_id = w.id
             WHERE l.tag_id = ?1 AND w.create_date BETWEEN ?2 AND ?3",
            params![tag_id, begin, end],
            |row| row.get(0),
        )?;
        Ok(hours)
    }

    /// Secondary breakdown beneath one primary tag: a self-join on the
    /// association table, excluding the primary tag itself and restricted
    /// to Secondary-level tags.
    pub(crate) fn sum_secondary_hours(
        &mut self,
        primary_tag_id: i64,
        begin: &str,
        end: &str,
    ) -> Result<Vec<(i64, String, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, COALESCE(SUM(w.time), 0.0)
             FROM work_item_tags p
             JOIN work_item_tags s ON s.work_id = p.work_id AND s.tag_id <> p.tag_id
             JOIN work_tags t ON t.id = s.tag_id AND t.level = 1
             JOIN work_items w ON w.id = p.work_id
             WHERE p.tag_id = ?1 AND w.create_date BETWEEN ?2 AND ?3
             GROUP BY t.id, t.name
             ORDER BY t.id ASC",
        )?;
        let rows = stmt
            .query_map(params![primary_tag_id, begin, end], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
