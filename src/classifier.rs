use crate::types::{CategorizedNews, Category, CategorySection, NewsItem};
use tracing::debug;

/// Maximum number of items kept per surviving category.
pub const MAX_PER_CATEGORY: usize = 8;

/// Partitions items into topical buckets by keyword score.
///
/// Category order is the tie-break order: when two categories reach the same
/// maximum score, the one declared first wins. The order therefore comes from
/// configuration, not from map iteration.
pub struct Classifier {
    categories: Vec<Category>,
    default_label: String,
}

impl Classifier {
    pub fn new(categories: Vec<Category>, default_label: impl Into<String>) -> Self {
        Self {
            categories,
            default_label: default_label.into(),
        }
    }

    /// Assign each item to exactly one category (or the default bucket), drop
    /// empty categories, and cap each surviving bucket.
    ///
    /// Items arrive recency-descending from the aggregator and keep that order
    /// within each bucket, so the cap keeps the newest items.
    pub fn classify(&self, items: Vec<NewsItem>) -> CategorizedNews {
        let mut buckets: Vec<Vec<NewsItem>> = vec![Vec::new(); self.categories.len()];
        let mut default_bucket: Vec<NewsItem> = Vec::new();

        for item in items {
            match self.best_category(&item) {
                Some(index) => buckets[index].push(item),
                None => default_bucket.push(item),
            }
        }

        let mut sections = Vec::new();
        for (category, mut bucket) in self.categories.iter().zip(buckets) {
            if bucket.is_empty() {
                continue;
            }
            bucket.truncate(MAX_PER_CATEGORY);
            sections.push(CategorySection {
                label: category.label.clone(),
                items: bucket,
            });
        }
        if !default_bucket.is_empty() {
            default_bucket.truncate(MAX_PER_CATEGORY);
            sections.push(CategorySection {
                label: self.default_label.clone(),
                items: default_bucket,
            });
        }

        debug!(sections = sections.len(), "Classified items");
        CategorizedNews { sections }
    }

    /// Index of the first category reaching the strict maximum score, or None
    /// when no category scores above zero.
    fn best_category(&self, item: &NewsItem) -> Option<usize> {
        let text = format!("{} {}", item.title, item.summary).to_lowercase();

        let mut best: Option<(usize, usize)> = None;
        for (index, category) in self.categories.iter().enumerate() {
            let score = keyword_score(&text, &category.keywords);
            if score == 0 {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Number of keywords occurring as substrings in the search text. Each
/// distinct keyword counts once; matching more keywords from one category
/// outweighs matching fewer from another.
fn keyword_score(text: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|k| text.contains(k.as_str())).count()
}
