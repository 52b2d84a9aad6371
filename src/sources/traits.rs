use crate::domain::{ApiResponse, SourceKind};
use crate::errors::IngestResult;

/// A syndication feed to pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedTarget {
    pub url: String,
    /// Skip TLS certificate validation for this feed only
    pub accept_invalid_certs: bool,
}

impl FeedTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accept_invalid_certs: false,
        }
    }

    pub fn insecure(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }
}

/// One configured thing to ingest during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    Syndication(FeedTarget),
    Api { topic: String },
}

impl SourceDescriptor {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceDescriptor::Syndication(_) => SourceKind::Syndication,
            SourceDescriptor::Api { .. } => SourceKind::Api,
        }
    }

    /// Human-readable label for logs
    pub fn label(&self) -> &str {
        match self {
            SourceDescriptor::Syndication(target) => &target.url,
            SourceDescriptor::Api { topic } => topic,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RawPayload {
    /// Undecoded feed body
    Syndication(String),
    Api(ApiResponse),
}

#[cfg_attr(test, mockall::automock)]
pub trait ContentFetcher: Send + Sync {
    /// The descriptor kind this fetcher serves
    fn kind(&self) -> SourceKind;

    /// Retrieve the raw payload for a descriptor. No persistence happens here.
    fn fetch(&self, descriptor: &SourceDescriptor) -> IngestResult<RawPayload>;
}
