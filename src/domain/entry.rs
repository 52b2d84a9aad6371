use serde::{Deserialize, Serialize};

/// A media attachment declared on a feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: Option<String>,
}

impl Enclosure {
    pub fn new(url: impl Into<String>, mime_type: Option<&str>) -> Self {
        Self {
            url: url.into(),
            mime_type: mime_type.map(str::to_string),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.trim().to_ascii_lowercase().starts_with("image/"))
    }
}

/// Source-format payload for a single item, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub enclosures: Vec<Enclosure>,
    pub categories: Vec<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    /// Explicit image reference (API payloads only)
    pub image_url: Option<String>,
    /// Per-item publisher name (API payloads only)
    pub source_name: Option<String>,
}

impl RawEntry {
    pub fn new(title: Option<&str>, link: Option<&str>) -> Self {
        Self {
            title: title.map(str::to_string),
            link: link.map(str::to_string),
            ..Default::default()
        }
    }

    /// Short label for log lines
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.link.as_deref())
            .unwrap_or("<untitled>")
    }
}

/// Response envelope of the news-search API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<ApiArticle>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArticle {
    #[serde(default)]
    pub source: Option<ApiSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

impl From<ApiArticle> for RawEntry {
    fn from(article: ApiArticle) -> Self {
        Self {
            title: article.title,
            link: article.url,
            summary: article.description,
            content: article.content,
            enclosures: Vec::new(),
            categories: Vec::new(),
            author: article.author,
            published: article.published_at,
            image_url: article.url_to_image,
            source_name: article.source.and_then(|s| s.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESPONSE: &str = r#"{
        "status": "ok",
        "totalResults": 2,
        "articles": [
            {
                "source": { "id": "bbc-news", "name": "BBC News" },
                "author": "BBC News",
                "title": "Chip makers rally",
                "description": "Shares rose sharply.",
                "url": "https://www.bbc.co.uk/news/business-1",
                "urlToImage": "https://ichef.bbci.co.uk/news/1.jpg",
                "publishedAt": "2024-03-01T09:30:00Z",
                "content": "Shares rose sharply on Friday..."
            },
            {
                "source": { "id": null, "name": null },
                "author": null,
                "title": "Untitled wire story",
                "description": null,
                "url": "https://wire.example.com/2",
                "urlToImage": null,
                "publishedAt": null,
                "content": null
            }
        ]
    }"#;

    #[test]
    fn test_api_response_deserializes() {
        let response: ApiResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();

        assert_eq!(response.status, "ok");
        assert_eq!(response.total_results, Some(2));
        assert_eq!(response.articles.len(), 2);
        assert_eq!(
            response.articles[0].url_to_image.as_deref(),
            Some("https://ichef.bbci.co.uk/news/1.jpg")
        );
    }

    #[test]
    fn test_api_article_into_raw_entry() {
        let response: ApiResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        let mut articles = response.articles.into_iter();

        let entry: RawEntry = articles.next().unwrap().into();
        assert_eq!(entry.title.as_deref(), Some("Chip makers rally"));
        assert_eq!(entry.link.as_deref(), Some("https://www.bbc.co.uk/news/business-1"));
        assert_eq!(entry.summary.as_deref(), Some("Shares rose sharply."));
        assert_eq!(entry.published.as_deref(), Some("2024-03-01T09:30:00Z"));
        assert_eq!(entry.source_name.as_deref(), Some("BBC News"));

        let entry: RawEntry = articles.next().unwrap().into();
        assert!(entry.source_name.is_none());
        assert!(entry.image_url.is_none());
    }

    #[test]
    fn test_error_envelope_deserializes() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;
        let response: ApiResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.status, "error");
        assert!(response.articles.is_empty());
        assert_eq!(response.code.as_deref(), Some("apiKeyInvalid"));
    }

    #[test]
    fn test_enclosure_is_image() {
        assert!(Enclosure::new("https://x/a.jpg", Some("image/jpeg")).is_image());
        assert!(Enclosure::new("https://x/a.png", Some("IMAGE/PNG")).is_image());
        assert!(!Enclosure::new("https://x/a.mp3", Some("audio/mpeg")).is_image());
        assert!(!Enclosure::new("https://x/a", None).is_image());
    }
}
