//! Two-level tag-time rollup.
//!
//! Dates are inclusive fixed-width `YYYY-MM-DD` strings, compared
//! lexicographically. Hours not covered by a tag at either level land in a
//! synthetic "unclassified" bucket so the tree always conserves the range
//! total.

use crate::error::Result;
use crate::models::{StatisticsResult, TagLevel, TagTime};
use crate::store::WorkStore;

/// Tolerance for floating-point hour sums.
const HOURS_EPSILON: f64 = 1e-9;

pub(crate) fn collect<S: WorkStore + ?Sized>(
    store: &mut S,
    begin: &str,
    end: &str,
) -> Result<StatisticsResult> {
    let total = store.range_total_hours(begin, end)?;
    if total <= 0.0 {
        return Ok(StatisticsResult::empty(begin, end));
    }

    let primary_tags: Vec<_> = store
        .all_work_tags()?
        .into_iter()
        .filter(|tag| tag.level == TagLevel::Primary)
        .collect();

    let mut result = StatisticsResult {
        date_begin: begin.to_string(),
        date_end: end.to_string(),
        total,
        tags: Vec::new(),
    };

    let mut primary_sum = 0.0;
    for tag in primary_tags {
        let hours = store.range_tag_hours(tag.id, begin, end)?;
        if hours <= 0.0 {
            continue;
        }

        let mut node = TagTime::new(tag.id, tag.name, hours);
        let mut nested_sum = 0.0;
        for (tag_id, name, nested_hours) in
            store.range_secondary_tag_hours(tag.id, begin, end)?
        {
            if nested_hours <= 0.0 {
                continue;
            }
            nested_sum += nested_hours;
            node.nested.push(TagTime::new(tag_id, name, nested_hours));
        }

        // Items tagged with this primary tag but no secondary tag.
        if node.hours - nested_sum > HOURS_EPSILON {
            node.nested.push(TagTime::unclassified(node.hours - nested_sum));
        }

        primary_sum += node.hours;
        result.tags.push(node);
    }

    // Items carrying no primary tag at all.
    if total - primary_sum > HOURS_EPSILON {
        result.tags.push(TagTime::unclassified(total - primary_sum));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use crate::models::{
        TagLevel, WorkItem, WorkTag, UNCLASSIFIED_LABEL, UNCLASSIFIED_TAG_ID,
    };
    use crate::sqlite::SqliteStore;
    use crate::store::WorkStore;

    fn store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.initialized().unwrap());
        store
    }

    fn tag(store: &mut SqliteStore, name: &str, level: TagLevel) -> i64 {
        let created = store.create_work_tag(&WorkTag::new(name, 0x00ff_0000, level)).unwrap();
        assert!(created.is_persisted());
        created.id
    }

    fn item(store: &mut SqliteStore, date: &str, hours: f64, tags: &[i64]) -> i64 {
        let created = store.create_work_item(&WorkItem::new(date, "", hours)).unwrap();
        assert!(created.is_persisted());
        for tag_id in tags {
            assert!(store.add_work_item_tag(created.id, *tag_id).unwrap());
        }
        created.id
    }

    #[test]
    fn test_empty_range_yields_empty_result() {
        let mut store = store();
        let result = store.tag_statistics("2025-01-01", "2025-01-31").unwrap();
        assert!(result.is_empty());
        assert!(result.total.abs() < 1e-9);
    }

    #[test]
    fn test_primary_with_secondary_and_unclassified_buckets() {
        // Item A: 4h, primary only. Item B: 2h, primary + secondary.
        let mut store = store();
        let project = tag(&mut store, "项目甲", TagLevel::Primary);
        let meeting = tag(&mut store, "会议", TagLevel::Secondary);
        item(&mut store, "2025-01-01", 4.0, &[project]);
        item(&mut store, "2025-01-01", 2.0, &[project, meeting]);

        let result = store.tag_statistics("2025-01-01", "2025-01-01").unwrap();
        assert!((result.total - 6.0).abs() < 1e-9);
        assert_eq!(result.tags.len(), 1);

        let top = &result.tags[0];
        assert_eq!(top.name, "项目甲");
        assert!((top.hours - 6.0).abs() < 1e-9);
        assert_eq!(top.nested.len(), 2);
        assert_eq!(top.nested[0].name, "会议");
        assert!((top.nested[0].hours - 2.0).abs() < 1e-9);
        assert_eq!(top.nested[1].name, UNCLASSIFIED_LABEL);
        assert_eq!(top.nested[1].tag_id, UNCLASSIFIED_TAG_ID);
        assert!((top.nested[1].hours - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_untagged_hours_land_in_top_level_unclassified() {
        let mut store = store();
        let dev = tag(&mut store, "开发", TagLevel::Primary);
        item(&mut store, "2025-02-10", 3.0, &[dev]);
        item(&mut store, "2025-02-11", 5.0, &[]);

        let result = store.tag_statistics("2025-02-01", "2025-02-28").unwrap();
        assert!((result.total - 8.0).abs() < 1e-9);
        assert_eq!(result.tags.len(), 2);
        assert_eq!(result.tags[1].tag_id, UNCLASSIFIED_TAG_ID);
        assert!((result.tags[1].hours - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_conservation_across_levels() {
        let mut store = store();
        let alpha = tag(&mut store, "alpha", TagLevel::Primary);
        let beta = tag(&mut store, "beta", TagLevel::Primary);
        let review = tag(&mut store, "review", TagLevel::Secondary);
        let docs = tag(&mut store, "docs", TagLevel::Secondary);
        item(&mut store, "2025-03-03", 2.5, &[alpha, review]);
        item(&mut store, "2025-03-04", 1.5, &[alpha, docs]);
        item(&mut store, "2025-03-05", 4.0, &[alpha]);
        item(&mut store, "2025-03-06", 3.0, &[beta]);
        item(&mut store, "2025-03-07", 1.0, &[]);

        let result = store.tag_statistics("2025-03-01", "2025-03-31").unwrap();
        let primary_sum: f64 = result.tags.iter().map(|t| t.hours).sum();
        assert!((primary_sum - result.total).abs() < 1e-9);
        for top in &result.tags {
            if top.nested.is_empty() {
                continue;
            }
            let nested_sum: f64 = top.nested.iter().map(|t| t.hours).sum();
            assert!((nested_sum - top.hours).abs() < 1e-9);
        }
    }

    #[test]
    fn test_range_is_inclusive_and_lexicographic() {
        let mut store = store();
        let dev = tag(&mut store, "dev", TagLevel::Primary);
        item(&mut store, "2024-12-31", 1.0, &[dev]);
        item(&mut store, "2025-01-01", 2.0, &[dev]);
        item(&mut store, "2025-01-31", 3.0, &[dev]);
        item(&mut store, "2025-02-01", 4.0, &[dev]);

        let result = store.tag_statistics("2025-01-01", "2025-01-31").unwrap();
        assert!((result.total - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentages_follow_caller_denominator() {
        let mut store = store();
        let dev = tag(&mut store, "dev", TagLevel::Primary);
        item(&mut store, "2025-04-01", 6.0, &[dev]);

        let result = store.tag_statistics("2025-04-01", "2025-04-01").unwrap();
        let top = &result.tags[0];
        // Against the computed total.
        assert!((top.percent_of(result.total) - 100.0).abs() < 1e-9);
        // Against a manually entered expected total.
        assert!((top.percent_of(8.0) - 75.0).abs() < 1e-9);
    }
}
