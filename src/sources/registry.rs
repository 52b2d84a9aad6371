use crate::domain::SourceKind;
use crate::errors::{IngestError, IngestResult};
use crate::sources::traits::{ContentFetcher, RawPayload, SourceDescriptor};

/// Dispatches each descriptor to the fetcher registered for its kind
pub struct FetcherRegistry {
    fetchers: Vec<Box<dyn ContentFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self {
            fetchers: Vec::new(),
        }
    }

    /// Later registrations for the same kind replace earlier ones
    pub fn register(&mut self, fetcher: Box<dyn ContentFetcher>) {
        let kind = fetcher.kind();
        self.fetchers.retain(|f| f.kind() != kind);
        self.fetchers.push(fetcher);
    }

    pub fn with(mut self, fetcher: Box<dyn ContentFetcher>) -> Self {
        self.register(fetcher);
        self
    }

    pub fn find_fetcher(&self, kind: SourceKind) -> Option<&dyn ContentFetcher> {
        self.fetchers
            .iter()
            .find(|f| f.kind() == kind)
            .map(|f| f.as_ref())
    }

    pub fn fetch(&self, descriptor: &SourceDescriptor) -> IngestResult<RawPayload> {
        let fetcher = self
            .find_fetcher(descriptor.kind())
            .ok_or_else(|| IngestError::UnsupportedSource(descriptor.kind().to_string()))?;

        fetcher.fetch(descriptor)
    }
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::traits::{FeedTarget, MockContentFetcher};

    fn mock(kind: SourceKind, body: &'static str) -> Box<dyn ContentFetcher> {
        let mut fetcher = MockContentFetcher::new();
        fetcher.expect_kind().return_const(kind);
        fetcher
            .expect_fetch()
            .returning(move |_| Ok(RawPayload::Syndication(body.to_string())));
        Box::new(fetcher)
    }

    #[test]
    fn test_dispatch_by_kind() {
        let registry = FetcherRegistry::new().with(mock(SourceKind::Syndication, "<rss/>"));

        let payload = registry
            .fetch(&SourceDescriptor::Syndication(FeedTarget::new("https://a.example/rss")))
            .unwrap();
        assert!(matches!(payload, RawPayload::Syndication(body) if body == "<rss/>"));
    }

    #[test]
    fn test_missing_fetcher_is_unsupported() {
        let registry = FetcherRegistry::new().with(mock(SourceKind::Syndication, "<rss/>"));

        let result = registry.fetch(&SourceDescriptor::Api {
            topic: "technology".to_string(),
        });
        assert!(matches!(result, Err(IngestError::UnsupportedSource(_))));
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let registry = FetcherRegistry::new()
            .with(mock(SourceKind::Syndication, "first"))
            .with(mock(SourceKind::Syndication, "second"));

        let payload = registry
            .fetch(&SourceDescriptor::Syndication(FeedTarget::new("https://a.example/rss")))
            .unwrap();
        assert!(matches!(payload, RawPayload::Syndication(body) if body == "second"));
    }
}
