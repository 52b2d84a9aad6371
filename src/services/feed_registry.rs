use tracing::{debug, info};
use url::Url;

use crate::config::API_KEY_VAR;
use crate::domain::{RawEntry, Source, SourceMetadata};
use crate::errors::{IngestError, IngestResult};
use crate::sources::ParsedFeed;
use crate::storage::traits::SourceRepository;

/// Name given to API articles whose publisher is not reported
pub const UNKNOWN_API_SOURCE: &str = "Unknown News API Source";

/// Find-or-create access to the source catalog
pub struct FeedRegistry<S: SourceRepository> {
    repository: S,
}

impl<S: SourceRepository> FeedRegistry<S> {
    pub fn new(repository: S) -> Self {
        Self { repository }
    }

    /// Return the source named `name`, creating it from `metadata` when the
    /// catalog has none. `metadata` is only invoked on creation.
    pub fn resolve_source<F>(&self, name: &str, metadata: F) -> IngestResult<Source>
    where
        F: FnOnce() -> SourceMetadata,
    {
        if let Some(existing) = self.repository.find_by_name(name)? {
            return Ok(existing);
        }

        let source = Source::new(name.to_string(), metadata());

        match self.repository.save(&source) {
            Ok(saved) => {
                info!(source = %saved.name, base_url = %saved.base_url, "Registered new source");
                Ok(saved)
            }
            Err(IngestError::SourceAlreadyExists(_)) => {
                // Lost a creation race: the stored row wins
                debug!(source = name, "Source created concurrently, re-reading");
                self.repository
                    .find_by_name(name)?
                    .ok_or_else(|| IngestError::SourceAlreadyExists(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub fn list(&self) -> IngestResult<Vec<Source>> {
        self.repository.get_all()
    }
}

/// Catalog name for a syndication feed: its title, else the feed URL's host
pub fn syndication_source_name(feed: &ParsedFeed, feed_url: &str) -> String {
    feed.title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| host_of(feed_url))
        .unwrap_or_else(|| feed_url.to_string())
}

pub fn syndication_metadata(feed: &ParsedFeed, feed_url: &str) -> SourceMetadata {
    let base_url = feed
        .link
        .clone()
        .unwrap_or_else(|| feed_url.to_string());

    SourceMetadata::new(base_url).with_feed_url(feed_url)
}

/// Catalog name for an API article: the reported publisher, else a fixed fallback
pub fn api_source_name(entry: &RawEntry) -> String {
    entry
        .source_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNKNOWN_API_SOURCE)
        .to_string()
}

/// Base URL is the article's host without `www.`, else the API root
pub fn api_metadata(entry: &RawEntry, api_base_url: &str) -> SourceMetadata {
    let base_url = entry
        .link
        .as_deref()
        .and_then(host_of)
        .map(|host| host.trim_start_matches("www.").to_string())
        .unwrap_or_else(|| api_base_url.to_string());

    SourceMetadata::new(base_url).with_api_key_ref(API_KEY_VAR)
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::{SqliteSourceRepository, SqliteStorage};
    use crate::storage::traits::MockSourceRepository;
    use std::cell::Cell;

    fn setup() -> FeedRegistry<SqliteSourceRepository> {
        let storage = SqliteStorage::in_memory().unwrap();
        FeedRegistry::new(SqliteSourceRepository::new(storage))
    }

    fn stored(name: &str, id: i64) -> Source {
        Source {
            id: Some(id),
            ..Source::new(name.to_string(), SourceMetadata::new("https://winner.example"))
        }
    }

    #[test]
    fn test_resolve_creates_once() {
        let registry = setup();

        let first = registry
            .resolve_source("Rust Blog", || SourceMetadata::new("https://blog.rust-lang.org/"))
            .unwrap();
        let second = registry
            .resolve_source("Rust Blog", || SourceMetadata::new("https://elsewhere.example/"))
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.base_url, "https://blog.rust-lang.org/");
        assert_eq!(registry.list().unwrap().len(), 1);
    }

    #[test]
    fn test_metadata_supplier_not_called_for_existing() {
        let registry = setup();
        registry
            .resolve_source("BBC News", || SourceMetadata::new("bbc.co.uk"))
            .unwrap();

        let calls = Cell::new(0);
        registry
            .resolve_source("BBC News", || {
                calls.set(calls.get() + 1);
                SourceMetadata::new("bbc.co.uk")
            })
            .unwrap();

        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let registry = setup();
        registry.resolve_source("Wired", || SourceMetadata::new("wired.com")).unwrap();
        registry.resolve_source("WIRED", || SourceMetadata::new("wired.com")).unwrap();

        assert_eq!(registry.list().unwrap().len(), 2);
    }

    #[test]
    fn test_lost_race_returns_stored_source() {
        let mut repo = MockSourceRepository::new();
        let mut lookups = 0;
        repo.expect_find_by_name().times(2).returning(move |name| {
            lookups += 1;
            Ok((lookups > 1).then(|| stored(name, 7)))
        });
        repo.expect_save()
            .times(1)
            .returning(|s| Err(IngestError::SourceAlreadyExists(s.name.clone())));

        let registry = FeedRegistry::new(repo);
        let source = registry
            .resolve_source("Ars Technica", || SourceMetadata::new("https://loser.example"))
            .unwrap();

        assert_eq!(source.id, Some(7));
        assert_eq!(source.base_url, "https://winner.example");
    }

    #[test]
    fn test_other_save_errors_propagate() {
        let mut repo = MockSourceRepository::new();
        repo.expect_find_by_name().returning(|_| Ok(None));
        repo.expect_save()
            .returning(|_| Err(IngestError::Database(rusqlite::Error::InvalidQuery)));

        let registry = FeedRegistry::new(repo);
        let result = registry.resolve_source("Ars Technica", SourceMetadata::default);

        assert!(matches!(result, Err(IngestError::Database(_))));
    }

    #[test]
    fn test_syndication_naming() {
        let feed = ParsedFeed {
            title: Some("Rust Blog".to_string()),
            link: Some("https://blog.rust-lang.org/".to_string()),
            entries: Vec::new(),
        };
        let url = "https://blog.rust-lang.org/feed.xml";

        assert_eq!(syndication_source_name(&feed, url), "Rust Blog");
        let metadata = syndication_metadata(&feed, url);
        assert_eq!(metadata.base_url, "https://blog.rust-lang.org/");
        assert_eq!(metadata.feed_url.as_deref(), Some(url));
        assert!(metadata.api_key_ref.is_none());

        let untitled = ParsedFeed::default();
        assert_eq!(syndication_source_name(&untitled, url), "blog.rust-lang.org");
        assert_eq!(syndication_metadata(&untitled, url).base_url, url);
    }

    #[test]
    fn test_api_naming() {
        let mut entry = RawEntry::new(Some("Story"), Some("https://www.bbc.co.uk/news/1"));
        entry.source_name = Some("BBC News".to_string());

        assert_eq!(api_source_name(&entry), "BBC News");
        let metadata = api_metadata(&entry, "https://newsapi.org/v2");
        assert_eq!(metadata.base_url, "bbc.co.uk");
        assert_eq!(metadata.api_key_ref.as_deref(), Some(API_KEY_VAR));
        assert!(metadata.feed_url.is_none());

        let anonymous = RawEntry::new(Some("Story"), Some("not a url"));
        assert_eq!(api_source_name(&anonymous), UNKNOWN_API_SOURCE);
        assert_eq!(
            api_metadata(&anonymous, "https://newsapi.org/v2").base_url,
            "https://newsapi.org/v2"
        );
    }
}
