pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod fetcher;
pub mod gemini;
pub mod hackmd;
pub mod mailer;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;

pub use aggregator::aggregate;
pub use classifier::Classifier;
pub use config::Config;
pub use fetcher::FeedFetcher;
pub use gemini::GeminiClient;
pub use pipeline::{DigestPipeline, RunSummary};
pub use report::GenerateText;
pub use types::*;
