use tracing::debug;

use crate::domain::{Article, DraftArticle, Source};
use crate::errors::{IngestError, IngestResult};
use crate::storage::traits::ArticleRepository;

/// What happened to a draft when it was merged into the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created(Article),
    Updated(Article),
    Unchanged(Article),
}

impl UpsertOutcome {
    pub fn into_article(self) -> Article {
        match self {
            UpsertOutcome::Created(a) | UpsertOutcome::Updated(a) | UpsertOutcome::Unchanged(a) => a,
        }
    }
}

/// Merges drafts into the catalog keyed by URL, newest publication wins
pub struct UpsertEngine<A: ArticleRepository> {
    repository: A,
}

impl<A: ArticleRepository> UpsertEngine<A> {
    pub fn new(repository: A) -> Self {
        Self { repository }
    }

    pub fn upsert(&self, draft: DraftArticle, source: &Source) -> IngestResult<UpsertOutcome> {
        let source_id = source
            .id
            .ok_or_else(|| IngestError::UnsavedSource(source.name.clone()))?;

        if let Some(existing) = self.repository.find_by_url(&draft.url)? {
            return self.merge(existing, draft);
        }

        match self.repository.save(&Article::from_draft(draft.clone(), source_id)) {
            Ok(created) => Ok(UpsertOutcome::Created(created)),
            Err(IngestError::ArticleAlreadyExists(url)) => {
                // Someone else inserted it first; merge against their row
                let existing = self
                    .repository
                    .find_by_url(&url)?
                    .ok_or(IngestError::ArticleAlreadyExists(url))?;
                self.merge(existing, draft)
            }
            Err(e) => Err(e),
        }
    }

    pub fn count(&self) -> IngestResult<i64> {
        self.repository.count()
    }

    fn merge(&self, mut existing: Article, draft: DraftArticle) -> IngestResult<UpsertOutcome> {
        if draft.published_date <= existing.published_date {
            debug!(url = %existing.url, "Stored article is current");
            return Ok(UpsertOutcome::Unchanged(existing));
        }

        debug!(
            url = %existing.url,
            stored = %existing.published_date,
            incoming = %draft.published_date,
            "Refreshing article with newer revision"
        );
        existing.apply_draft(draft);
        let updated = self.repository.save(&existing)?;
        Ok(UpsertOutcome::Updated(updated))
    }
}
