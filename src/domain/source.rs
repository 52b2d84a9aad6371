use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Syndication,
    Api,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Syndication => "syndication",
            SourceKind::Api => "api",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named origin of articles, unique by `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: Option<i64>,
    pub name: String,
    pub base_url: String,
    pub feed_url: Option<String>,
    /// Configuration key of the credential used to query this source
    pub api_key_ref: Option<String>,
}

impl Source {
    pub fn new(name: String, metadata: SourceMetadata) -> Self {
        Self {
            id: None,
            name,
            base_url: metadata.base_url,
            feed_url: metadata.feed_url,
            api_key_ref: metadata.api_key_ref,
        }
    }
}

/// URL metadata filled in when a source is first created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMetadata {
    pub base_url: String,
    pub feed_url: Option<String>,
    pub api_key_ref: Option<String>,
}

impl SourceMetadata {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_feed_url(mut self, feed_url: impl Into<String>) -> Self {
        self.feed_url = Some(feed_url.into());
        self
    }

    pub fn with_api_key_ref(mut self, api_key_ref: impl Into<String>) -> Self {
        self.api_key_ref = Some(api_key_ref.into());
        self
    }
}
