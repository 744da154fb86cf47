use chrono::{DateTime, SecondsFormat, Utc};

/// Literal layout GPX timestamps are written in, e.g. `2023-08-06T12:00:00+0200`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parse a GPX timestamp. Returns `None` instead of failing so callers can
/// leave the field absent.
///
/// RFC 3339 is accepted as well, which covers the `Z` suffix most GPS
/// devices write.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Format a timestamp for output, always in UTC with a `Z` suffix.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
