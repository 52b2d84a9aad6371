use crate::domain::{Article, Source};
use crate::errors::IngestResult;

#[cfg_attr(test, mockall::automock)]
pub trait SourceRepository: Send + Sync {
    fn find_by_name(&self, name: &str) -> IngestResult<Option<Source>>;
    /// Insert a new source, or update an existing one when `id` is set.
    /// A name collision on insert is `SourceAlreadyExists`.
    fn save(&self, source: &Source) -> IngestResult<Source>;
    fn get_all(&self) -> IngestResult<Vec<Source>>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ArticleRepository: Send + Sync {
    fn find_by_url(&self, url: &str) -> IngestResult<Option<Article>>;
    /// Insert a new article, or update an existing one when `id` is set.
    /// A URL collision on insert is `ArticleAlreadyExists`.
    fn save(&self, article: &Article) -> IngestResult<Article>;
    fn count(&self) -> IngestResult<i64>;
}
