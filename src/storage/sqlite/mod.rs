mod connection;
mod source_repository;
mod article_repository;

pub use connection::SqliteStorage;
pub use source_repository::SqliteSourceRepository;
pub use article_repository::SqliteArticleRepository;
