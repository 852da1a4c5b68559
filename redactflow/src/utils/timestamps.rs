//! Timestamp helpers.

use chrono::{DateTime, Utc};

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Formats a timestamp as ISO 8601 with microsecond precision.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use redactflow::utils::format_iso8601;
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
/// assert_eq!(format_iso8601(&ts), "2024-03-15T09:30:00.000000+00:00");
/// ```
#[must_use]
pub fn format_iso8601(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}
