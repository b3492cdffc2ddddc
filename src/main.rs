use anyhow::Context;
use clap::Parser;
use news_digest::{Config, DigestPipeline};
use std::path::PathBuf;
use tracing::{info, warn};

/// Daily tech news digest: fetch, categorize, render and deliver.
#[derive(Parser, Debug)]
#[command(name = "news-digest", version, about)]
struct Cli {
    /// Recency window in hours for feed entries
    #[arg(long, default_value_t = 24)]
    hours_back: u32,

    /// Directory for persisted reports (overrides REPORT_DIR)
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Render and persist the report but skip note upload and email
    #[arg(long)]
    skip_delivery: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    info!(hours_back = cli.hours_back, "Starting news digest run");

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(dir) = cli.report_dir {
        config.report_dir = dir;
    }

    let pipeline = DigestPipeline::new(config).context("failed to build pipeline")?;
    let summary = pipeline
        .run(cli.hours_back, cli.skip_delivery)
        .await
        .context("digest run failed")?;

    if summary.items_fetched == 0 {
        warn!("Run finished without any news items");
        return Ok(());
    }

    info!(
        items = summary.items_fetched,
        categories = summary.categories,
        mail_sent = summary.mail_sent,
        "Run complete"
    );
    if let Some(path) = &summary.report_path {
        info!(path = %path.display(), "Report available");
    }
    if let Some(url) = &summary.note_url {
        info!(url = %url, "Note available");
    }

    Ok(())
}
