use serde::Deserialize;

/// Browser identities rotated across fetch attempts
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

/// Main configuration structure for Sumi-Folio
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// URL the crawl starts from (depth 0)
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum depth to crawl from the start URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Only follow links on the start URL's host
    #[serde(rename = "same-domain-only")]
    pub same_domain_only: bool,

    /// Extra attempts after the first failed one
    #[serde(rename = "retry-count")]
    pub retry_count: u32,

    /// Number of concurrent fetch workers
    pub concurrency: u32,

    /// Fixed delay added before every fetch attempt (milliseconds)
    #[serde(rename = "per-domain-delay")]
    pub per_domain_delay: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            max_depth: 2,
            same_domain_only: false,
            retry_count: 3,
            concurrency: 2,
            per_domain_delay: 0,
        }
    }
}

/// HTTP fetch tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Lower bound of the randomized politeness delay (milliseconds)
    #[serde(rename = "politeness-min-ms")]
    pub politeness_min_ms: u64,

    /// Upper bound of the randomized politeness delay (milliseconds)
    #[serde(rename = "politeness-max-ms")]
    pub politeness_max_ms: u64,

    /// First retry backoff (milliseconds), doubled per attempt
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Cap on the retry backoff (milliseconds)
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// User-Agent strings rotated across attempts
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            politeness_min_ms: 3000,
            politeness_max_ms: 5000,
            backoff_base_ms: 5000,
            backoff_max_ms: 60_000,
            timeout_secs: 15,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Markdown,
}

impl OutputFormat {
    /// Infers the format from a file extension, defaulting to HTML
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".md") || lower.ends_with(".markdown") {
            Self::Markdown
        } else {
            Self::Html
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the combined document
    pub path: String,

    /// Explicit format; inferred from `path` when absent
    pub format: Option<OutputFormat>,

    /// Document title; defaults to "Scraped Data from <start url>"
    pub title: Option<String>,
}

impl OutputConfig {
    /// Returns the configured format or the one implied by the path
    pub fn effective_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.path))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "scraped_data.html".to_string(),
            format: None,
            title: None,
        }
    }
}
