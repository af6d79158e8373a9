use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tag id used for the synthetic "unclassified" statistics bucket.
pub const UNCLASSIFIED_TAG_ID: i64 = 0;

/// Display name of the synthetic "unclassified" statistics bucket.
pub const UNCLASSIFIED_LABEL: &str = "未分类";

/// Grouping level of a tag. Primary tags form the top level of the
/// statistics rollup; Secondary tags nest beneath a primary tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TagLevel {
    #[default]
    Primary,
    Secondary,
}

impl TagLevel {
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        if value == 0 {
            Self::Primary
        } else {
            Self::Secondary
        }
    }

    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }
}

impl std::fmt::Display for TagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// Priority of a work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        match value {
            0 => Self::Low,
            2 => Self::High,
            _ => Self::Normal,
        }
    }

    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Work tag - classifies work items for grouping and statistics
///
/// Names are unique across the table. The id is assigned by storage on
/// create; `id == 0` means "not persisted".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkTag {
    pub id: i64,
    pub name: String,
    /// Packed RGB color for display.
    pub color: i32,
    pub level: TagLevel,
    pub disabled: bool,
}

impl WorkTag {
    #[must_use]
    pub fn new(name: impl Into<String>, color: i32, level: TagLevel) -> Self {
        Self {
            id: 0,
            name: name.into(),
            color,
            level,
            disabled: false,
        }
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

/// Work item - one diary entry with a date, a comment and spent hours
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    /// Fixed-width `YYYY-MM-DD` date string; lexicographic order equals
    /// chronological order.
    pub create_date: String,
    pub comment: String,
    /// Spent time in hours.
    pub time: f64,
    pub priority: Priority,
}

impl WorkItem {
    #[must_use]
    pub fn new(create_date: impl Into<String>, comment: impl Into<String>, time: f64) -> Self {
        Self {
            id: 0,
            create_date: create_date.into(),
            comment: comment.into(),
            time,
            priority: Priority::Normal,
        }
    }

    /// Build an item for a concrete calendar date.
    #[must_use]
    pub fn dated(date: NaiveDate, comment: impl Into<String>, time: f64) -> Self {
        Self::new(date.format("%Y-%m-%d").to_string(), comment, time)
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

/// RedMine project mirror - id comes from the external tracker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedMineProject {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub closed: bool,
}

/// RedMine activity mirror - id comes from the external tracker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedMineActivity {
    pub id: i64,
    pub name: String,
}

/// RedMine issue mirror - id comes from the external tracker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedMineIssue {
    pub id: i64,
    pub project_id: i64,
    pub subject: String,
    pub assigned_to: String,
    pub description: String,
    pub closed: bool,
}

/// Time entry pending or completed upload to the external tracker,
/// keyed 1:1 on the work item id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkTimeEntry {
    pub work_id: i64,
    /// Remote entry id; 0 until the upload completes.
    pub entry_id: i64,
    pub activity_id: i64,
    pub issue_id: i64,
}

impl WorkTimeEntry {
    #[must_use]
    pub fn new(work_id: i64, activity_id: i64, issue_id: i64) -> Self {
        Self {
            work_id,
            entry_id: 0,
            activity_id,
            issue_id,
        }
    }

    /// The upload convention: a positive entry id marks the row as
    /// uploaded to the external tracker.
    #[must_use]
    pub fn was_uploaded(&self) -> bool {
        self.entry_id > 0
    }
}

/// One node of the statistics rollup tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagTime {
    pub tag_id: i64,
    pub name: String,
    pub hours: f64,
    pub nested: Vec<TagTime>,
}

impl TagTime {
    #[must_use]
    pub fn new(tag_id: i64, name: impl Into<String>, hours: f64) -> Self {
        Self {
            tag_id,
            name: name.into(),
            hours,
            nested: Vec::new(),
        }
    }

    /// Synthetic bucket for hours not covered by any tag at this level.
    #[must_use]
    pub fn unclassified(hours: f64) -> Self {
        Self::new(UNCLASSIFIED_TAG_ID, UNCLASSIFIED_LABEL, hours)
    }

    /// Percentage of this node against a caller-chosen denominator.
    ///
    /// The aggregator never stores percentages; callers divide by either
    /// the computed range total or a manually entered expected total.
    #[must_use]
    pub fn percent_of(&self, denominator: f64) -> f64 {
        if denominator <= 0.0 {
            0.0
        } else {
            self.hours / denominator * 100.0
        }
    }
}

/// Date-ranged two-level tag-time rollup. Computed per query, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsResult {
    pub date_begin: String,
    pub date_end: String,
    /// Sum of hours over every work item in range, tagged or not.
    pub total: f64,
    pub tags: Vec<TagTime>,
}

impl StatisticsResult {
    #[must_use]
    pub fn empty(date_begin: impl Into<String>, date_end: impl Into<String>) -> Self {
        Self {
            date_begin: date_begin.into(),
            date_end: date_end.into(),
            total: 0.0,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_level_roundtrip() {
        assert_eq!(TagLevel::from_i64(TagLevel::Primary.as_i64()), TagLevel::Primary);
        assert_eq!(TagLevel::from_i64(TagLevel::Secondary.as_i64()), TagLevel::Secondary);
        assert_eq!(TagLevel::from_i64(7), TagLevel::Secondary);
    }

    #[test]
    fn test_priority_defaults_to_normal() {
        assert_eq!(Priority::from_i64(99), Priority::Normal);
        assert_eq!(Priority::from_i64(0), Priority::Low);
        assert_eq!(Priority::from_i64(2), Priority::High);
    }

    #[test]
    fn test_dated_item_formats_fixed_width() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let item = WorkItem::dated(date, "review", 1.5);
        assert_eq!(item.create_date, "2025-03-07");
        assert!(!item.is_persisted());
    }

    #[test]
    fn test_percent_of_uses_caller_denominator() {
        let node = TagTime::new(3, "dev", 6.0);
        assert!((node.percent_of(8.0) - 75.0).abs() < 1e-9);
        assert!((node.percent_of(12.0) - 50.0).abs() < 1e-9);
        assert!((node.percent_of(0.0)).abs() < 1e-9);
    }

    #[test]
    fn test_was_uploaded_convention() {
        let mut entry = WorkTimeEntry::new(1, 9, 1001);
        assert!(!entry.was_uploaded());
        entry.entry_id = 42;
        assert!(entry.was_uploaded());
    }
}
