use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// ISO-8601 with a literal Z suffix, the only form the upstream emits and
/// the form the query parameters are sent in.
pub const UTC_ZULU_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const XMLTV_FORMAT: &str = "%Y%m%d%H%M%S %z";

/// Strict parse of `YYYY-MM-DDTHH:MM:SSZ` into a UTC instant. Offsets,
/// fractional seconds, or trailing garbage are rejected, not guessed at.
pub fn parse_utc_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, UTC_ZULU_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Render an instant as XMLTV local time in the destination zone:
/// `YYYYMMDDHHMMSS ±HHMM`, offset taken from the zone at that instant.
pub fn format_xmltv(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(XMLTV_FORMAT).to_string()
}

/// Render an instant for the upstream query parameters.
pub fn format_query(instant: DateTime<Utc>) -> String {
    instant.format(UTC_ZULU_FORMAT).to_string()
}
