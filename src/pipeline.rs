use crate::aggregator::aggregate;
use crate::classifier::Classifier;
use crate::config::Config;
use crate::fetcher::FeedFetcher;
use crate::gemini::GeminiClient;
use crate::hackmd::HackmdClient;
use crate::mailer::Mailer;
use crate::report::{assemble, GenerateText};
use crate::storage::save_report;
use crate::types::Result;
use chrono::Utc;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a single run. Delivery failures leave the run as a partial
/// success: the report is always persisted before any network delivery.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub items_fetched: usize,
    pub categories: usize,
    pub report_path: Option<PathBuf>,
    pub note_url: Option<String>,
    pub mail_sent: bool,
}

/// One full digest run: fetch, aggregate, classify, render, persist, deliver.
/// Single pass, sequential stages; each stage fully consumes its input before
/// the next starts.
pub struct DigestPipeline {
    config: Config,
    fetcher: FeedFetcher,
    classifier: Classifier,
    generator: Box<dyn GenerateText>,
    api_client: Client,
}

impl DigestPipeline {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = FeedFetcher::new(&config.fetch)?;
        let classifier =
            Classifier::new(config.categories.clone(), config.default_category.clone());

        // Collaborator calls share one client; the same timeout bounds them.
        let api_client = Client::builder()
            .timeout(Duration::from_secs(config.fetch.timeout_seconds))
            .build()?;
        let generator: Box<dyn GenerateText> = Box::new(GeminiClient::new(
            api_client.clone(),
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        ));

        Ok(Self {
            config,
            fetcher,
            classifier,
            generator,
            api_client,
        })
    }

    /// Swap the generative-text backend. Used by tests; the default backend
    /// is the Gemini client.
    pub fn with_generator(mut self, generator: Box<dyn GenerateText>) -> Self {
        self.generator = generator;
        self
    }

    pub async fn run(&self, hours_back: u32, skip_delivery: bool) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let items = self
            .fetcher
            .fetch_recent(&self.config.sources, hours_back)
            .await;
        summary.items_fetched = items.len();
        if items.is_empty() {
            warn!("No news items fetched, ending run");
            return Ok(summary);
        }

        let items = aggregate(items);
        let categorized = self.classifier.classify(items);
        summary.categories = categorized.sections.len();
        info!(
            items = categorized.total_items(),
            categories = summary.categories,
            "Classification complete"
        );

        let now = Utc::now();
        let report = assemble(self.generator.as_ref(), &categorized, now).await;

        // Persist before any delivery is attempted.
        let path = save_report(&self.config.report_dir, &report, now)?;
        summary.report_path = Some(path);

        if skip_delivery {
            info!("Delivery skipped");
            return Ok(summary);
        }

        if let Some(token) = &self.config.hackmd_token {
            let hackmd = HackmdClient::new(self.api_client.clone(), token.clone());
            let title = format!("Daily Tech News Digest {}", now.format("%Y-%m-%d"));
            match hackmd.create_note(&title, &report).await {
                Ok(url) => {
                    info!(url = %url, "Note created");
                    summary.note_url = Some(url);
                }
                Err(e) => warn!(error = %e, "Note upload failed, continuing"),
            }
        }

        if let Some(mail_config) = &self.config.mail {
            match Mailer::new(mail_config.clone()) {
                Ok(mailer) => {
                    match mailer
                        .send_digest(summary.note_url.as_deref(), &report, now)
                        .await
                    {
                        Ok(()) => summary.mail_sent = true,
                        Err(e) => warn!(error = %e, "Mail delivery failed"),
                    }
                }
                Err(e) => warn!(error = %e, "Mailer setup failed"),
            }
        }

        Ok(summary)
    }
}
