use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("News API key is not configured")]
    MissingApiKey,

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    #[error("News API response parsing failed: {0}")]
    ApiParse(String),

    // Entry errors
    #[error("Entry is missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unparseable timestamp: {0}")]
    InvalidDate(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported source kind: {0}")]
    UnsupportedSource(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Source already exists: {0}")]
    SourceAlreadyExists(String),

    #[error("Source has not been saved: {0}")]
    UnsavedSource(String),

    #[error("Article already exists: {0}")]
    ArticleAlreadyExists(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Network-level failures that may succeed on the next cycle
    pub fn is_transient(&self) -> bool {
        matches!(self, IngestError::Http(_))
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::ApiParse(err.to_string())
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
