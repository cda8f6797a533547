//! Timestamps are generated in Indian Standard Time regardless of the host zone.

use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, Utc};

/// Asia/Kolkata is UTC+05:30 year-round.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is within ±24h")
}

pub fn now_ist() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&ist())
}

/// ISO-8601 with millisecond precision, e.g. `2024-05-01T09:15:00.000+05:30`.
pub fn to_iso(ts: DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, false)
}

pub fn now_ist_iso() -> String {
    to_iso(now_ist())
}

pub fn days_from_now_iso(days: i64) -> String {
    to_iso(now_ist() + Duration::days(days))
}

/// Parses a stored ISO timestamp for ordering. Missing or malformed values
/// sort as the Unix epoch.
pub fn sort_key(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
