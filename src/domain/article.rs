use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized article data that has not been merged into the catalog yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftArticle {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub published_date: DateTime<Utc>,
    pub category: String,
    pub author: Option<String>,
}

impl DraftArticle {
    pub fn new(url: String, title: String, published_date: DateTime<Utc>) -> Self {
        Self {
            url,
            title,
            description: None,
            image_url: String::new(),
            published_date,
            category: String::new(),
            author: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_image_url(mut self, image_url: String) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn with_category(mut self, category: String) -> Self {
        self.category = category;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }
}

/// A catalog article, identified by its canonical URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<i64>,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub published_date: DateTime<Utc>,
    pub category: String,
    pub author: Option<String>,
    pub view_count: i64,
    pub source_id: i64,
}

impl Article {
    pub fn from_draft(draft: DraftArticle, source_id: i64) -> Self {
        Self {
            id: None,
            url: draft.url,
            title: draft.title,
            description: draft.description,
            image_url: draft.image_url,
            published_date: draft.published_date,
            category: draft.category,
            author: draft.author,
            view_count: 0,
            source_id,
        }
    }

    /// Overwrite content fields from a newer draft. Identity, owner and the
    /// view counter are left alone.
    pub fn apply_draft(&mut self, draft: DraftArticle) {
        self.title = draft.title;
        self.description = draft.description;
        self.image_url = draft.image_url;
        self.published_date = draft.published_date;
        self.author = draft.author;
        self.category = draft.category;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(title: &str, day: u32) -> DraftArticle {
        DraftArticle::new(
            "https://example.com/a".to_string(),
            title.to_string(),
            Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        )
        .with_category("General".to_string())
        .with_image_url("https://example.com/a.png".to_string())
    }

    #[test]
    fn test_from_draft_starts_with_zero_views() {
        let article = Article::from_draft(draft("First", 1), 7);

        assert_eq!(article.id, None);
        assert_eq!(article.source_id, 7);
        assert_eq!(article.view_count, 0);
        assert_eq!(article.title, "First");
    }

    #[test]
    fn test_apply_draft_preserves_identity_and_views() {
        let mut article = Article::from_draft(draft("First", 1), 7);
        article.id = Some(3);
        article.view_count = 42;

        article.apply_draft(
            draft("Second", 2)
                .with_author(Some("Jane".to_string()))
                .with_description(Some("Updated".to_string())),
        );

        assert_eq!(article.id, Some(3));
        assert_eq!(article.view_count, 42);
        assert_eq!(article.source_id, 7);
        assert_eq!(article.title, "Second");
        assert_eq!(article.author.as_deref(), Some("Jane"));
        assert_eq!(article.description.as_deref(), Some("Updated"));
    }
}
