use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::domain::RawEntry;
use crate::errors::{IngestError, IngestResult};

/// Image used when an entry carries no usable picture
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://placehold.co/600x350/E0E0E0/333333?text=News+Image";

/// Hosts that serve generic filler images rather than real article art
const PLACEHOLDER_DOMAINS: &[&str] = &["via.placeholder.com"];

/// Pick a representative image for a syndication entry.
///
/// Stages, first hit wins:
/// 1. first enclosure declared as `image/*`
/// 2. first `<img src>` in the summary markup
/// 3. first `<img src>` in the content markup, resolved against the entry link
/// 4. the fixed placeholder
pub fn extract_image(entry: &RawEntry) -> String {
    let label = entry.label();

    let candidate = from_enclosures(entry)
        .inspect(|url| debug!(entry = label, url = %url, "Image found in enclosures"))
        .or_else(|| {
            entry
                .summary
                .as_deref()
                .and_then(first_img_src)
                .inspect(|url| debug!(entry = label, url = %url, "Image found in summary markup"))
        })
        .or_else(|| from_content(entry));

    sanitize_image(candidate)
}

/// Replace empty or placeholder-domain image URLs with the platform placeholder
pub fn sanitize_image(candidate: Option<String>) -> String {
    match candidate {
        Some(url) if !url.trim().is_empty() && !is_placeholder(&url) => url.trim().to_string(),
        other => {
            debug!(original = ?other, "Using placeholder image");
            PLACEHOLDER_IMAGE_URL.to_string()
        }
    }
}

/// First non-blank `src` of an `<img>` element in an HTML fragment
pub fn first_img_src(html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }

    let selector = Selector::parse("img[src]").ok()?;
    let document = Html::parse_fragment(html);

    document
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(str::to_string)
}

fn from_enclosures(entry: &RawEntry) -> Option<String> {
    entry
        .enclosures
        .iter()
        .find(|e| e.is_image() && !e.url.trim().is_empty())
        .map(|e| e.url.clone())
}

fn from_content(entry: &RawEntry) -> Option<String> {
    let src = first_img_src(entry.content.as_deref()?)?;
    let label = entry.label();

    match resolve_against(entry.link.as_deref(), &src) {
        Ok(url) => {
            debug!(entry = label, url = %url, "Image found in content markup");
            Some(url)
        }
        Err(e) => {
            debug!(entry = label, src = %src, error = %e, "Discarding unresolvable content image");
            None
        }
    }
}

/// Make `src` absolute, using `base` for relative references
fn resolve_against(base: Option<&str>, src: &str) -> IngestResult<String> {
    match Url::parse(src) {
        Ok(url) => Ok(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| {
                IngestError::InvalidUrl(format!("relative image '{}' without entry link", src))
            })?;
            let base = Url::parse(base).map_err(|e| IngestError::InvalidUrl(e.to_string()))?;
            base.join(src)
                .map(|u| u.to_string())
                .map_err(|e| IngestError::InvalidUrl(e.to_string()))
        }
        Err(e) => Err(IngestError::InvalidUrl(e.to_string())),
    }
}

fn is_placeholder(url: &str) -> bool {
    PLACEHOLDER_DOMAINS.iter().any(|domain| url.contains(domain))
}
