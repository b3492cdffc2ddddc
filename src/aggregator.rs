use crate::types::NewsItem;
use tracing::debug;

/// Hard cap on items flowing into classification, protecting downstream
/// request-size limits.
pub const MAX_ITEMS: usize = 50;

/// Order the flat fetch output by publish time, newest first, and truncate to
/// the capacity bound.
///
/// The sort is stable: items with identical timestamps keep their input order.
/// No deduplication by link or title is performed; the same story from two
/// sources is intentionally kept twice, since each source's framing may
/// differ.
pub fn aggregate(mut items: Vec<NewsItem>) -> Vec<NewsItem> {
    items.sort_by(|a, b| b.published.cmp(&a.published));
    items.truncate(MAX_ITEMS);
    debug!(count = items.len(), "Aggregated items");
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(title: &str, minute: u32) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            summary: title.to_string(),
            published: Utc.with_ymd_and_hms(2025, 8, 25, 12, minute, 0).unwrap(),
            source: "Test".to_string(),
        }
    }

    #[test]
    fn sorts_newest_first() {
        let items = aggregate(vec![item("old", 0), item("new", 30), item("mid", 15)]);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn output_is_non_increasing_in_timestamp() {
        let items = aggregate((0..40).map(|m| item(&format!("i{m}"), m % 20)).collect());
        for pair in items.windows(2) {
            assert!(pair[0].published >= pair[1].published);
        }
    }

    #[test]
    fn truncates_to_capacity_bound() {
        let items = aggregate((0..60).map(|m| item(&format!("i{m}"), m % 60)).collect());
        assert_eq!(items.len(), MAX_ITEMS);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let items = aggregate(vec![item("first", 10), item("second", 10), item("third", 10)]);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicates_are_not_removed() {
        let items = aggregate(vec![item("same", 10), item("same", 10)]);
        assert_eq!(items.len(), 2);
    }
}
