use crate::target::{FetchTarget, HeaderSet, RequestParams};
use serde::Deserialize;

/// Main configuration structure for Sumi-Tide
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Targets to fetch, in order
    #[serde(default)]
    pub queue: Vec<QueueEntry>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    /// Headers merged into every request
    #[serde(default)]
    pub headers: Option<HeaderSet>,
}

impl Config {
    /// Converts the configured queue into fetch targets
    pub fn targets(&self) -> Vec<FetchTarget> {
        self.queue.iter().cloned().map(FetchTarget::from).collect()
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Upper bound on simultaneously open requests; unbounded when absent
    #[serde(rename = "max-concurrent", default)]
    pub max_concurrent: Option<u32>,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: None,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// A queue entry: either an address string or an inline table of request parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueueEntry {
    Address(String),
    Params(RequestParams),
}

impl From<QueueEntry> for FetchTarget {
    fn from(entry: QueueEntry) -> Self {
        match entry {
            QueueEntry::Address(address) => FetchTarget::Address(address),
            QueueEntry::Params(params) => FetchTarget::Params(params),
        }
    }
}
