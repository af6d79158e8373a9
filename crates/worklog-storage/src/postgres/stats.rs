use crate::error::Result;

use super::PgStore;

impl PgStore {
    pub(crate) fn sum_range_hours(&mut self, begin: &str, end: &str) -> Result<f64> {
        let row = self.client.query_one(
            "SELECT CAST(COALESCE(SUM(time), 0) AS DOUBLE PRECISION)
             FROM work_items
             WHERE create_date BETWEEN $1 AND $2",
            &[&begin, &end],
        )?;
        Ok(row.get(0))
    }

    pub(crate) fn sum_tag_hours(&mut self, tag_id: i64, begin: &str, end: &str) -> Result<f64> {
        let row = self.client.query_one(
            "SELECT CAST(COALESCE(SUM(w.time), 0) AS DOUBLE PRECISION)
             FROM work_items w
             JOIN work_item_tags l ON l.work_id = w.id
             WHERE l.tag_id = $1 AND w.create_date BETWEEN $2 AND $3",
            &[&tag_id, &begin, &end],
        )?;
        Ok(row.get(0))
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
        let rows = self.client.query(
            "SELECT t.id, t.name, CAST(COALESCE(SUM(w.time), 0) AS DOUBLE PRECISION)
             FROM work_item_tags p
             JOIN work_item_tags s ON s.work_id = p.work_id AND s.tag_id <> p.tag_id
             JOIN work_tags t ON t.id = s.tag_id AND t.level = 1
             JOIN work_items w ON w.id = p.work_id
             WHERE p.tag_id = $1 AND w.create_date BETWEEN $2 AND $3
             GROUP BY t.id, t.name
             ORDER BY t.id ASC",
            &[&primary_tag_id, &begin, &end],
        )?;
        Ok(rows
            .iter()
            .map(|row| (row.get(0), row.get(1), row.get(2)))
            .collect())
    }
}
