use rusqlite::{OptionalExtension, Row};

use crate::domain::Article;
use crate::errors::{IngestError, IngestResult};
use crate::storage::sqlite::connection::is_constraint_violation;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::ArticleRepository;

const SELECT_COLUMNS: &str = "SELECT id, url, title, description, image_url, published_date, \
     category, author, view_count, source_id FROM articles";

pub struct SqliteArticleRepository {
    storage: SqliteStorage,
}

impl SqliteArticleRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
        Ok(Article {
            id: Some(row.get(0)?),
            url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            image_url: row.get(4)?,
            published_date: row.get(5)?,
            category: row.get(6)?,
            author: row.get(7)?,
            view_count: row.get(8)?,
            source_id: row.get(9)?,
        })
    }
}

impl ArticleRepository for SqliteArticleRepository {
    fn find_by_url(&self, url: &str) -> IngestResult<Option<Article>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!("{} WHERE url = ?1", SELECT_COLUMNS))?;

        stmt.query_row([url], Self::from_row)
            .optional()
            .map_err(IngestError::from)
    }

    fn save(&self, article: &Article) -> IngestResult<Article> {
        let conn = self.storage.connection()?;

        if let Some(id) = article.id {
            conn.execute(
                "UPDATE articles SET title = ?1, description = ?2, image_url = ?3, published_date = ?4, \
                 category = ?5, author = ?6, view_count = ?7, source_id = ?8 WHERE id = ?9",
                rusqlite::params![
                    &article.title,
                    &article.description,
                    &article.image_url,
                    &article.published_date,
                    &article.category,
                    &article.author,
                    article.view_count,
                    article.source_id,
                    id,
                ],
            )?;
            return Ok(article.clone());
        }

        let inserted = conn.execute(
            "INSERT INTO articles (url, title, description, image_url, published_date, category, \
             author, view_count, source_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                &article.url,
                &article.title,
                &article.description,
                &article.image_url,
                &article.published_date,
                &article.category,
                &article.author,
                article.view_count,
                article.source_id,
            ],
        );

        match inserted {
            Ok(_) => Ok(Article {
                id: Some(conn.last_insert_rowid()),
                ..article.clone()
            }),
            Err(e) if is_constraint_violation(&e) => {
                Err(IngestError::ArticleAlreadyExists(article.url.clone()))
            }
            Err(e) => Err(IngestError::from(e)),
        }
    }

    fn count(&self) -> IngestResult<i64> {
        let conn = self.storage.connection()?;
        let count = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count)
    }
}
