//! Read-only access to the legacy database file.
//!
//! The old schema is structurally different from the current one: notes and
//! tracker columns live inline on `works`, tags carry `is_main`/`hidden`
//! flags instead of a level enum, and the association table is called
//! `work_links`.

use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;

use crate::error::Result;

pub struct LegacyTag {
    pub id: i64,
    pub name: String,
    pub color: i32,
    pub is_main: bool,
    pub hidden: bool,
}

pub struct LegacyWork {
    pub id: i64,
    pub date: String,
    pub content: String,
    pub hours: f64,
    pub priority: i64,
    pub note: Option<String>,
    pub activity_id: i64,
    pub issue_id: i64,
    pub uploaded: bool,
}

/// Read-only handle on a legacy database file.
pub struct LegacyDatabase {
    conn: Connection,
}

impl LegacyDatabase {
    /// Open the file without write access; the source is never modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        log::info!("opened legacy database at {}", path.display());
        Ok(Self { conn })
    }

    pub fn version(&self) -> Result<i32> {
        let version: Option<i32> =
            self.conn
                .query_row("SELECT MAX(version) FROM data_versions", [], |row| {
                    row.get(0)
                })?;
        Ok(version.unwrap_or(0))
    }

    pub fn tags(&self) -> Result<Vec<LegacyTag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color, is_main, hidden FROM tags ORDER BY id ASC")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(LegacyTag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                    is_main: row.get::<_, i64>(3)? != 0,
                    hidden: row.get::<_, i64>(4)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    pub fn works(&self) -> Result<Vec<LegacyWork>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, content, hours, priority, note, activity, issue, uploaded
             FROM works ORDER BY id ASC",
        )?;
        let works = stmt
            .query_map([], |row| {
                Ok(LegacyWork {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    content: row.get(2)?,
                    hours: row.get(3)?,
                    priority: row.get(4)?,
                    note: row.get(5)?,
                    activity_id: row.get(6)?,
                    issue_id: row.get(7)?,
                    uploaded: row.get::<_, i64>(8)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(works)
    }

    pub fn links(&self) -> Result<Vec<(i64, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT work_id, tag_id FROM work_links ORDER BY work_id ASC, tag_id ASC")?;
        let links = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(links)
    }

    pub fn activities(&self) -> Result<Vec<(i64, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM activities ORDER BY id ASC")?;
        let activities = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(activities)
    }

    /// Distinct issue ids referenced by legacy rows; details are re-fetched
    /// live from the tracker during import.
    pub fn issue_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM issues ORDER BY id ASC")?;
        let ids = stmt
            .query_map(params![], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
