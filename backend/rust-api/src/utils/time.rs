use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 timestamp with microsecond precision, e.g. `2025-03-01T09:30:00.123456Z`
pub fn iso_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}
