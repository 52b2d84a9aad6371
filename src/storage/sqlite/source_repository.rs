use rusqlite::{OptionalExtension, Row};

use crate::domain::Source;
use crate::errors::{IngestError, IngestResult};
use crate::storage::sqlite::connection::is_constraint_violation;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::SourceRepository;

const SELECT_COLUMNS: &str = "SELECT id, name, base_url, feed_url, api_key_ref FROM sources";

pub struct SqliteSourceRepository {
    storage: SqliteStorage,
}

impl SqliteSourceRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Source> {
        Ok(Source {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            base_url: row.get(2)?,
            feed_url: row.get(3)?,
            api_key_ref: row.get(4)?,
        })
    }
}

impl SourceRepository for SqliteSourceRepository {
    fn find_by_name(&self, name: &str) -> IngestResult<Option<Source>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!("{} WHERE name = ?1", SELECT_COLUMNS))?;

        stmt.query_row([name], Self::from_row)
            .optional()
            .map_err(IngestError::from)
    }

    fn save(&self, source: &Source) -> IngestResult<Source> {
        let conn = self.storage.connection()?;

        if let Some(id) = source.id {
            conn.execute(
                "UPDATE sources SET name = ?1, base_url = ?2, feed_url = ?3, api_key_ref = ?4 WHERE id = ?5",
                (
                    &source.name,
                    &source.base_url,
                    &source.feed_url,
                    &source.api_key_ref,
                    id,
                ),
            )?;
            return Ok(source.clone());
        }

        let inserted = conn.execute(
            "INSERT INTO sources (name, base_url, feed_url, api_key_ref) VALUES (?1, ?2, ?3, ?4)",
            (
                &source.name,
                &source.base_url,
                &source.feed_url,
                &source.api_key_ref,
            ),
        );

        match inserted {
            Ok(_) => Ok(Source {
                id: Some(conn.last_insert_rowid()),
                ..source.clone()
            }),
            Err(e) if is_constraint_violation(&e) => {
                Err(IngestError::SourceAlreadyExists(source.name.clone()))
            }
            Err(e) => Err(IngestError::from(e)),
        }
    }

    fn get_all(&self) -> IngestResult<Vec<Source>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY name", SELECT_COLUMNS))?;

        let sources = stmt.query_map([], Self::from_row)?;
        sources.collect::<Result<Vec<_>, _>>().map_err(IngestError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceMetadata;

    fn setup_repo() -> SqliteSourceRepository {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteSourceRepository::new(storage)
    }

    fn source(name: &str) -> Source {
        Source::new(
            name.to_string(),
            SourceMetadata::new("https://blog.rust-lang.org/")
                .with_feed_url("https://blog.rust-lang.org/feed.xml"),
        )
    }

    #[test]
    fn test_save_and_find_by_name() {
        let repo = setup_repo();

        let saved = repo.save(&source("Rust Blog")).unwrap();
        assert!(saved.id.is_some());

        let found = repo.find_by_name("Rust Blog").unwrap().unwrap();
        assert_eq!(found, saved);
        assert_eq!(found.feed_url.as_deref(), Some("https://blog.rust-lang.org/feed.xml"));
        assert!(found.api_key_ref.is_none());
    }

    #[test]
    fn test_name_lookup_is_case_sensitive() {
        let repo = setup_repo();
        repo.save(&source("Rust Blog")).unwrap();

        assert!(repo.find_by_name("rust blog").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let repo = setup_repo();
        repo.save(&source("Rust Blog")).unwrap();

        let result = repo.save(&source("Rust Blog"));
        assert!(matches!(result, Err(IngestError::SourceAlreadyExists(name)) if name == "Rust Blog"));
    }

    #[test]
    fn test_get_all_sorted_by_name() {
        let repo = setup_repo();
        repo.save(&source("Zeta")).unwrap();
        repo.save(&source("Alpha")).unwrap();

        let names: Vec<String> = repo.get_all().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_update_existing() {
        let repo = setup_repo();
        let mut saved = repo.save(&source("Rust Blog")).unwrap();

        saved.base_url = "https://www.rust-lang.org/".to_string();
        repo.save(&saved).unwrap();

        let found = repo.find_by_name("Rust Blog").unwrap().unwrap();
        assert_eq!(found.base_url, "https://www.rust-lang.org/");
    }
}
