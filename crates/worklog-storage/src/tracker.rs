//! Port to the remote issue tracker.
//!
//! The storage core never speaks HTTP itself; the legacy importer re-fetches
//! live issue and project details through this trait so the mirror tables
//! are rebuilt from current data instead of stale legacy rows. Errors are
//! transport errors and carry whatever context the implementation attaches.

use anyhow::Result;

use crate::models::{RedMineIssue, RedMineProject};

/// Synchronous fetch capability of the external tracker.
pub trait IssueTracker {
    /// Fetch one issue by its external id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the issue does not exist.
    fn fetch_issue(&self, issue_id: i64) -> Result<RedMineIssue>;

    /// Fetch one project by its external id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the project does not exist.
    fn fetch_project(&self, project_id: i64) -> Result<RedMineProject>;
}
