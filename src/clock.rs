//! Wall-clock formatting shared by records, logs, and export filenames.

use time::{OffsetDateTime, UtcOffset, macros::format_description};

/// Render an instant as an ISO-8601 UTC string with millisecond precision,
/// e.g. `2026-10-19T08:30:00.123Z`.
pub fn iso_timestamp(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    at.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ))
    .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Current time via [`iso_timestamp`].
pub fn now_iso() -> String {
    iso_timestamp(OffsetDateTime::now_utc())
}

/// Compact UTC stamp safe for filenames, e.g. `20261019T083000Z`.
pub fn file_stamp(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    at.format(format_description!(
        "[year][month][day]T[hour][minute][second]Z"
    ))
    .unwrap_or_else(|_| at.unix_timestamp().to_string())
}
