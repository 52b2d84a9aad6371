use tracing::warn;
use url::Url;

use crate::domain::{DraftArticle, RawEntry, SourceKind};
use crate::errors::IngestError;
use crate::normalize::date::{parse_date, DateFormat};
use crate::normalize::image::{extract_image, sanitize_image};

/// Category assigned to syndication entries that declare none
pub const DEFAULT_CATEGORY: &str = "General";

/// Per-source settings that steer normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    pub kind: SourceKind,
    pub default_category: String,
}

impl SourceContext {
    pub fn syndication() -> Self {
        Self {
            kind: SourceKind::Syndication,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// API articles carry no category; the queried topic stands in for one
    pub fn api(topic: &str) -> Self {
        Self {
            kind: SourceKind::Api,
            default_category: topic.to_string(),
        }
    }

    fn date_format(&self) -> DateFormat {
        match self.kind {
            SourceKind::Syndication => DateFormat::Feed,
            SourceKind::Api => DateFormat::IsoInstant,
        }
    }
}

/// Turn a raw entry into a draft article.
///
/// Entries without a title or a resolvable link are dropped with a warning.
pub fn normalize(raw: &RawEntry, ctx: &SourceContext) -> Option<DraftArticle> {
    // Title is kept verbatim; only blank values are rejected
    let Some(title) = raw.title.as_deref().filter(|t| !t.trim().is_empty()) else {
        reject(raw, IngestError::MissingField("title"));
        return None;
    };

    let Some(link) = non_blank(raw.link.as_deref()) else {
        reject(raw, IngestError::MissingField("link"));
        return None;
    };
    if let Err(e) = Url::parse(link) {
        reject(raw, IngestError::InvalidUrl(format!("{}: {}", link, e)));
        return None;
    }

    let category = raw
        .categories
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .unwrap_or(ctx.default_category.as_str())
        .to_string();

    let image_url = match ctx.kind {
        SourceKind::Syndication => extract_image(raw),
        SourceKind::Api => sanitize_image(raw.image_url.clone()),
    };

    let published = parse_date(raw.published.as_deref(), ctx.date_format());

    let draft = DraftArticle::new(link.to_string(), title.to_string(), published)
        .with_description(raw.summary.clone().filter(|s| !s.trim().is_empty()))
        .with_category(category)
        .with_author(non_blank(raw.author.as_deref()).map(str::to_string))
        .with_image_url(image_url);

    Some(draft)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn reject(raw: &RawEntry, reason: IngestError) {
    warn!(entry = raw.label(), error = %reason, "Dropping entry");
}
