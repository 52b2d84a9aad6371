use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use crate::errors::{IngestError, IngestResult};

/// Layouts seen in the wild that are neither RFC 3339 nor RFC 2822
const FEED_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z", // offset without colon
    "%Y-%m-%d %H:%M:%S %z",
    "%A, %d %B %Y %H:%M:%S %z", // long day and month names
];

const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// Feed-native timestamps (RFC 3339, RFC 2822 and common variants)
    Feed,
    /// Strict ISO-8601 instant, as returned by the news API
    IsoInstant,
}

/// Parse a timestamp, reporting failures to the caller
pub fn try_parse_date(raw: Option<&str>, format: DateFormat) -> IngestResult<DateTime<Utc>> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IngestError::InvalidDate("missing".to_string()))?;

    let parsed = match format {
        DateFormat::IsoInstant => DateTime::parse_from_rfc3339(raw).ok(),
        DateFormat::Feed => DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc2822(raw))
            .ok()
            .or_else(|| {
                FEED_LAYOUTS
                    .iter()
                    .find_map(|layout| DateTime::parse_from_str(raw, layout).ok())
            }),
    };

    if let Some(dt) = parsed {
        return Ok(dt.with_timezone(&Utc));
    }

    if format == DateFormat::Feed {
        // Zone-less timestamps are taken as UTC
        if let Some(naive) = NAIVE_LAYOUTS
            .iter()
            .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        {
            return Ok(naive.and_utc());
        }
    }

    Err(IngestError::InvalidDate(raw.to_string()))
}

/// Parse a timestamp, falling back to the current time when it is absent or
/// malformed. Never fails.
pub fn parse_date(raw: Option<&str>, format: DateFormat) -> DateTime<Utc> {
    match try_parse_date(raw, format) {
        Ok(dt) => dt,
        Err(e) => {
            warn!(error = %e, ?format, "Falling back to ingestion time for published date");
            Utc::now()
        }
    }
}
