use crate::types::{CategorizedNews, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Items rendered per section by the fallback renderer.
const FALLBACK_ITEMS_PER_SECTION: usize = 5;
/// Summary length in the fallback rendering.
const FALLBACK_SUMMARY_CHARS: usize = 150;

/// Seam for the generative-text service. The pipeline only needs a single
/// prompt-in, text-out call; everything else about the service is opaque.
#[async_trait]
pub trait GenerateText: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Produce the digest markdown for a categorized run.
///
/// Delegates to the generative service and falls back to the deterministic
/// template on any failure. The fallback produces valid output for every
/// input the classifier can emit, including a run where only the default
/// bucket is populated.
pub async fn assemble(
    generator: &dyn GenerateText,
    news: &CategorizedNews,
    now: DateTime<Utc>,
) -> String {
    let prompt = build_prompt(news, now);
    match generator.generate(&prompt).await {
        Ok(text) => {
            info!("Generated digest via text service");
            text
        }
        Err(e) => {
            warn!(error = %e, "Text service failed, using fallback renderer");
            render_fallback(news, now)
        }
    }
}

/// Build the generation prompt: the JSON-serialized categorized map plus a
/// literal template describing the expected output sections.
pub fn build_prompt(news: &CategorizedNews, now: DateTime<Utc>) -> String {
    let total = news.total_items();
    let data = serde_json::to_string_pretty(&news.to_json()).unwrap_or_else(|_| "{}".to_string());
    let date = now.format("%Y-%m-%d");
    let timestamp = now.format("%Y-%m-%d %H:%M");

    format!(
        r#"Based on the following {total} categorized tech news items, write a professional daily tech news digest.

News data:
{data}

Follow this format exactly:

# Daily Tech News Digest {date}
*Generated {timestamp} UTC*

---

## Today's Highlights
Pick the 3-4 most important or interesting stories and explain in 2-3 sentences each why they matter.

---

## Category Details

For every category that has news:
1. Open with 1-2 sentences summarizing the day's developments in that area.
2. List the category's items, each with:
   - **Title**: the headline
   - **Summary**: the key points in 2-3 sentences
   - **Source**: the originating site
   - **Link**: the original URL

---

## Trend Watch
In 3-4 sentences, analyze what today's news says about where the industry is heading.

---

Keep the tone professional but readable, and make sure every item keeps its original link."#
    )
}

/// Deterministic templated report used when the generative service is
/// unavailable. Fixed shape: a header, then one section per non-empty
/// category with title, source, link and a truncated summary per item.
pub fn render_fallback(news: &CategorizedNews, now: DateTime<Utc>) -> String {
    let mut report = format!(
        "# Daily Tech News Digest {}\n*Generated {} UTC*\n\n---\n\n",
        now.format("%Y-%m-%d"),
        now.format("%Y-%m-%d %H:%M"),
    );

    for section in &news.sections {
        report.push_str(&format!("## {}\n\n", section.label));
        for (i, item) in section
            .items
            .iter()
            .take(FALLBACK_ITEMS_PER_SECTION)
            .enumerate()
        {
            let summary: String = item.summary.chars().take(FALLBACK_SUMMARY_CHARS).collect();
            report.push_str(&format!("### {}. {}\n", i + 1, item.title));
            report.push_str(&format!("- **Source**: {}\n", item.source));
            report.push_str(&format!("- **Link**: [Read more]({})\n", item.link));
            report.push_str(&format!("- **Summary**: {summary}...\n\n"));
        }
        report.push_str("---\n\n");
    }

    report
}
