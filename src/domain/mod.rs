pub mod source;
pub mod article;
pub mod entry;

pub use source::{Source, SourceKind, SourceMetadata};
pub use article::{Article, DraftArticle};
pub use entry::{ApiArticle, ApiResponse, ApiSource, Enclosure, RawEntry};
