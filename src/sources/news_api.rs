use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};
use url::Url;

use crate::domain::{ApiResponse, SourceKind};
use crate::errors::{IngestError, IngestResult};
use crate::sources::traits::{ContentFetcher, RawPayload, SourceDescriptor};

const USER_AGENT: &str = concat!("newswire/", env!("CARGO_PKG_VERSION"));

/// Header carrying the credential, so it never appears in request URLs
const API_KEY_HEADER: &str = "X-Api-Key";

/// Queries the news-search API's `everything` endpoint per topic
pub struct NewsApiFetcher {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsApiFetcher {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .connect_timeout(timeout)
                .timeout(timeout)
                .build()
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Falling back to default HTTP client for news API");
                    Client::new()
                }),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build the search URL for a topic
    fn search_url(&self, topic: &str) -> IngestResult<Url> {
        let endpoint = format!("{}/everything", self.base_url);
        Url::parse_with_params(&endpoint, &[("q", topic)])
            .map_err(|e| IngestError::InvalidUrl(format!("{}: {}", endpoint, e)))
    }

    fn fetch_topic(&self, topic: &str) -> IngestResult<ApiResponse> {
        let api_key = self.api_key.as_deref().ok_or(IngestError::MissingApiKey)?;
        let url = self.search_url(topic)?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .map_err(redact)?;
        let status_error = response.error_for_status_ref().err().map(redact);
        let body = response.text().map_err(redact)?;

        if let Some(err) = status_error {
            // The API explains rejections in its JSON envelope
            if let Err(IngestError::ApiParse(reason)) = decode_response(&body) {
                debug!(topic, reason = %reason, "API rejected request");
            }
            return Err(err);
        }

        let envelope = decode_response(&body)?;
        debug!(
            topic,
            total_results = ?envelope.total_results,
            received = envelope.articles.len(),
            "Fetched API results"
        );
        Ok(envelope)
    }
}

impl ContentFetcher for NewsApiFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Api
    }

    fn fetch(&self, descriptor: &SourceDescriptor) -> IngestResult<RawPayload> {
        match descriptor {
            SourceDescriptor::Api { topic } => self.fetch_topic(topic).map(RawPayload::Api),
            other => Err(IngestError::UnsupportedSource(other.kind().to_string())),
        }
    }
}

/// Strip the request URL from transport errors before they reach the logs
fn redact(err: reqwest::Error) -> IngestError {
    IngestError::Http(err.without_url())
}

/// Decode an API body, rejecting envelopes whose status is not `ok`
pub fn decode_response(body: &str) -> IngestResult<ApiResponse> {
    let envelope: ApiResponse = serde_json::from_str(body)?;

    if !envelope.status.eq_ignore_ascii_case("ok") {
        return Err(IngestError::ApiParse(format!(
            "status '{}' ({}): {}",
            envelope.status,
            envelope.code.as_deref().unwrap_or("no code"),
            envelope.message.as_deref().unwrap_or("no message")
        )));
    }

    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(api_key: Option<&str>) -> NewsApiFetcher {
        NewsApiFetcher::new(
            "https://newsapi.example/v2/",
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_search_url_encodes_topic() {
        let url = fetcher(Some("k")).search_url("bbc news").unwrap();

        assert_eq!(url.path(), "/v2/everything");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("q".to_string(), "bbc news".to_string())]);
    }

    #[test]
    fn test_transport_error_does_not_leak_key() {
        let fetcher = NewsApiFetcher::new(
            "http://127.0.0.1:9/v2",
            Some("SECRET123".to_string()),
            Duration::from_secs(2),
        );

        let err = fetcher
            .fetch(&SourceDescriptor::Api {
                topic: "technology".to_string(),
            })
            .unwrap_err();

        assert!(matches!(err, IngestError::Http(_)));
        assert!(!err.to_string().contains("SECRET123"));
        assert!(!format!("{:?}", err).contains("SECRET123"));
    }

    #[test]
    fn test_missing_key_short_circuits() {
        let result = fetcher(None).fetch(&SourceDescriptor::Api {
            topic: "technology".to_string(),
        });
        assert!(matches!(result, Err(IngestError::MissingApiKey)));
    }

    #[test]
    fn test_rejects_syndication_descriptor() {
        let result = fetcher(Some("k")).fetch(&SourceDescriptor::Syndication(
            crate::sources::FeedTarget::new("https://a.example/rss"),
        ));
        assert!(matches!(result, Err(IngestError::UnsupportedSource(_))));
    }

    #[test]
    fn test_decode_ok_response() {
        let body = r#"{"status":"ok","totalResults":1,"articles":[{"title":"T","url":"https://x.example/1"}]}"#;
        let response = decode_response(body).unwrap();
        assert_eq!(response.articles.len(), 1);
    }

    #[test]
    fn test_decode_error_status() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;
        let result = decode_response(body);
        assert!(matches!(result, Err(IngestError::ApiParse(msg)) if msg.contains("apiKeyInvalid")));
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode_response("<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(IngestError::ApiParse(_))));
    }
}
