use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single normalized feed entry.
///
/// Created by the fetcher and never mutated afterwards; the aggregator and
/// classifier only reorder and regroup these records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: DateTime<Utc>,
    pub source: String,
}

/// A named feed endpoint. Static configuration for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A category label plus the lowercase keyword substrings used to score items
/// against it. Declaration order matters: it is the tie-break order.
#[derive(Debug, Clone)]
pub struct Category {
    pub label: String,
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(label: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            label: label.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// One non-empty bucket of the classifier output.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySection {
    pub label: String,
    pub items: Vec<NewsItem>,
}

/// Ordered mapping from category label to items, in category declaration
/// order. Only non-empty categories appear; each holds at most the per-category
/// cap of items, recency-descending.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorizedNews {
    pub sections: Vec<CategorySection>,
}

impl CategorizedNews {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Serialize as a JSON object keyed by category label, preserving section
    /// order (serde_json::Map keeps insertion order).
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for section in &self.sections {
            map.insert(
                section.label.clone(),
                serde_json::to_value(&section.items).unwrap_or_default(),
            );
        }
        serde_json::Value::Object(map)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    FeedParse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("report generation failed: {0}")]
    Generation(String),

    #[error("note upload failed: {0}")]
    NoteUpload(String),

    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;
