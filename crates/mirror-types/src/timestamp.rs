//! Timestamp wire format.
//!
//! Every timestamp leaves the service as RFC-3339 in UTC with all nine
//! fractional digits, e.g. `2024-03-01T12:00:00.123456789Z`. The width is
//! fixed, so the same text doubles as the storage form: string equality is
//! instant equality and lexical order is chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::validation::{TimestampFormat, parse_timestamp};

/// Render a timestamp in the canonical wire/storage form.
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw, TimestampFormat::Rfc3339Nano).map_err(serde::de::Error::custom)
}

/// Same format for optional fields. Absent, `null` and `""` all read as `None`.
pub mod option {
    use super::*;

    pub fn serialize<S>(ts: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ts {
            Some(ts) => serializer.serialize_str(&format(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => parse_timestamp(&raw, TimestampFormat::Rfc3339Nano)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format(&whole), "2024-03-01T12:00:00.000000000Z");

        let fine = whole + chrono::Duration::nanoseconds(5);
        assert_eq!(format(&fine), "2024-03-01T12:00:00.000000005Z");
        assert!(format(&whole) < format(&fine));
    }
}
