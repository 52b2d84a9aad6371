use std::time::Duration;

use crate::errors::{IngestError, IngestResult};

pub const DEFAULT_API_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_INGESTION_RATE_MS: u64 = 1_800_000;
pub const DEFAULT_TOPIC: &str = "technology";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Name of the variable holding the API credential. Sources created from the
/// API keep this name as their credential reference, never the key itself.
pub const API_KEY_VAR: &str = "NEWS_API_KEY";

/// Value shipped in sample configuration files
const API_KEY_PLACEHOLDER: &str = "your-news-api-key-here";

#[derive(Debug, Clone)]
pub struct Config {
    pub rss_feeds: Vec<String>,
    pub insecure_feeds: Vec<String>,
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub ingestion_interval: Duration,
    pub topics: Vec<String>,
    pub fetch_timeout: Duration,
    pub db_path: String,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> IngestResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Default db_path is relative to executable directory
        if std::env::var("NEWSWIRE_DB_PATH").is_err() {
            if let Some(dir) = exe_dir {
                config.db_path = dir.join("newswire.db").to_string_lossy().into_owned();
            }
        }

        Ok(config)
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> IngestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rss_feeds = split_list(lookup("RSS_FEEDS").as_deref().unwrap_or_default());
        let insecure_feeds =
            split_list(lookup("RSS_INSECURE_FEEDS").as_deref().unwrap_or_default());

        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != API_KEY_PLACEHOLDER);

        let api_base_url = lookup("NEWS_API_BASE_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let rate_ms = parse_number(&lookup, "NEWS_INGESTION_RATE_MS", DEFAULT_INGESTION_RATE_MS)?;
        if rate_ms == 0 {
            return Err(IngestError::Config(
                "NEWS_INGESTION_RATE_MS must be greater than zero".to_string(),
            ));
        }

        let mut topics = split_list(lookup("NEWS_API_TOPICS").as_deref().unwrap_or_default());
        if topics.is_empty() {
            topics.push(DEFAULT_TOPIC.to_string());
        }

        let timeout_secs = parse_number(&lookup, "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;

        let db_path = lookup("NEWSWIRE_DB_PATH").unwrap_or_else(|| "./newswire.db".to_string());

        Ok(Self {
            rss_feeds,
            insecure_feeds,
            api_key,
            api_base_url,
            ingestion_interval: Duration::from_millis(rate_ms),
            topics,
            fetch_timeout: Duration::from_secs(timeout_secs.max(1)),
            db_path,
        })
    }

    pub fn api_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn allows_invalid_certs(&self, feed_url: &str) -> bool {
        self.insecure_feeds.iter().any(|f| f == feed_url)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<F>(lookup: &F, key: &str, default: u64) -> IngestResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| IngestError::Config(format!("{} must be a number, got '{}'", key, raw))),
        _ => Ok(default),
    }
}
