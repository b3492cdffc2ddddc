use crate::types::{Category, DigestError, FeedSource, Result};
use std::env;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_REPORT_DIR: &str = "reports";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-digest/0.1".to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from: String,
    pub recipients: Vec<String>,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
}

/// Process-wide configuration, built once at startup and passed by reference
/// into each component. No component reads the environment on its own.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub hackmd_token: Option<String>,
    pub mail: Option<MailConfig>,
    pub report_dir: PathBuf,
    pub sources: Vec<FeedSource>,
    pub categories: Vec<Category>,
    pub default_category: String,
    pub fetch: FetchConfig,
}

impl Config {
    /// Build the configuration from environment variables.
    ///
    /// `GEMINI_API_KEY` is required and checked before any network activity.
    /// The mail sink is enabled by setting `TO_EMAIL`; once enabled, the rest
    /// of the mail group (`FROM_EMAIL`, `SMTP_SERVER`, `EMAIL_USERNAME`,
    /// `EMAIL_PASSWORD`) is required. `HACKMD_TOKEN` is optional and its
    /// absence silently disables the note upload.
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = require_var("GEMINI_API_KEY")?;
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let hackmd_token = env::var("HACKMD_TOKEN").ok().filter(|t| !t.is_empty());

        let mail = match env::var("TO_EMAIL") {
            Ok(to) if !to.trim().is_empty() => {
                let recipients = parse_recipients(&to);
                if recipients.is_empty() {
                    return Err(DigestError::Config(
                        "TO_EMAIL contains no usable addresses".to_string(),
                    ));
                }
                let smtp_port = match env::var("SMTP_PORT") {
                    Ok(port) => port.parse::<u16>().map_err(|_| {
                        DigestError::Config(format!("SMTP_PORT is not a valid port: {port}"))
                    })?,
                    Err(_) => DEFAULT_SMTP_PORT,
                };
                Some(MailConfig {
                    from: require_var("FROM_EMAIL")?,
                    recipients,
                    smtp_server: require_var("SMTP_SERVER")?,
                    smtp_port,
                    username: require_var("EMAIL_USERNAME")?,
                    password: require_var("EMAIL_PASSWORD")?,
                })
            }
            _ => None,
        };

        let report_dir = env::var("REPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_REPORT_DIR));

        let sources = default_sources();
        for source in &sources {
            validate_feed_url(&source.url)?;
        }

        Ok(Self {
            gemini_api_key,
            gemini_model,
            hackmd_token,
            mail,
            report_dir,
            sources,
            categories: default_categories(),
            default_category: DEFAULT_CATEGORY_LABEL.to_string(),
            fetch: FetchConfig::default(),
        })
    }
}

fn require_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DigestError::Config(format!(
            "environment variable {name} must be set"
        ))),
    }
}

/// Split a comma-separated address list, trimming whitespace around each entry.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|addr| addr.trim())
        .filter(|addr| !addr.is_empty())
        .map(|addr| addr.to_string())
        .collect()
}

fn validate_feed_url(url_str: &str) -> Result<()> {
    let url = Url::parse(url_str)?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DigestError::Config(format!(
            "feed URL {url_str} has unsupported scheme '{other}'"
        ))),
    }
}

pub const DEFAULT_CATEGORY_LABEL: &str = "Other Tech News";

/// The reference deployment's feed set.
pub fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new("TechCrunch", "https://techcrunch.com/feed/"),
        FeedSource::new("The Verge", "https://www.theverge.com/rss/index.xml"),
        FeedSource::new("Ars Technica", "http://feeds.arstechnica.com/arstechnica/index"),
        FeedSource::new("Wired", "https://www.wired.com/feed/rss"),
        FeedSource::new("MIT Technology Review", "https://www.technologyreview.com/feed/"),
        FeedSource::new("Hacker News", "https://hnrss.org/frontpage"),
        FeedSource::new("IEEE Spectrum", "https://spectrum.ieee.org/rss"),
    ]
}

/// Scored categories in tie-break order. Items matching none of these fall
/// into the default bucket.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new(
            "AI & Machine Learning",
            &[
                "ai",
                "artificial intelligence",
                "machine learning",
                "neural",
                "gpt",
                "claude",
                "openai",
                "deepmind",
                "llm",
                "chatbot",
                "transformer",
                "deep learning",
                "computer vision",
                "natural language",
            ],
        ),
        Category::new(
            "Security",
            &[
                "security",
                "breach",
                "hack",
                "vulnerability",
                "cyber",
                "malware",
                "encryption",
                "privacy",
                "ransomware",
                "phishing",
                "zero-day",
                "exploit",
            ],
        ),
        Category::new(
            "Cloud & Infrastructure",
            &[
                "cloud",
                "aws",
                "azure",
                "gcp",
                "docker",
                "kubernetes",
                "serverless",
                "microservices",
                "devops",
                "infrastructure",
            ],
        ),
        Category::new(
            "Software Development",
            &[
                "programming",
                "developer",
                "code",
                "github",
                "open source",
                "framework",
                "api",
                "software",
                "javascript",
                "python",
                "react",
                "node",
            ],
        ),
        Category::new(
            "Startups & Funding",
            &[
                "startup",
                "funding",
                "investment",
                "ipo",
                "acquisition",
                "venture",
                "business",
                "unicorn",
                "valuation",
            ],
        ),
        Category::new(
            "Consumer Tech",
            &[
                "iphone",
                "android",
                "smartphone",
                "tablet",
                "wearable",
                "consumer",
                "apple",
                "samsung",
                "google pixel",
            ],
        ),
        Category::new(
            "Science & Research",
            &[
                "research",
                "study",
                "paper",
                "university",
                "breakthrough",
                "discovery",
                "journal",
                "peer review",
            ],
        ),
    ]
}
