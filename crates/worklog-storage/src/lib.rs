//! Storage engine for the worklog time diary.
//!
//! One contract ([`WorkStore`]), two interchangeable relational backends
//! ([`SqliteStore`], [`PgStore`]), a stepwise schema-migration runner, a
//! two-level tag-time statistics rollup, and an all-or-nothing importer for
//! the legacy database format.

pub mod config;
pub mod error;
pub mod import;
mod migrate;
pub mod models;
pub mod postgres;
pub mod sqlite;
mod stats;
pub mod store;
pub mod tracker;
pub mod version;

pub use config::{PgConfig, SqliteConfig};
pub use error::{Result, StorageError};
pub use models::{
    Priority, RedMineActivity, RedMineIssue, RedMineProject, StatisticsResult, TagLevel, TagTime,
    WorkItem, WorkTag, WorkTimeEntry, UNCLASSIFIED_LABEL, UNCLASSIFIED_TAG_ID,
};
pub use self::postgres::PgStore;
pub use sqlite::SqliteStore;
pub use store::WorkStore;
pub use tracker::IssueTracker;
pub use version::{DataVersion, CURRENT_DATA_VERSION, LEGACY_DATA_VERSION};
