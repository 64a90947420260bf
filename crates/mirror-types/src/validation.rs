//! Parse rules for raw strings arriving in paths and bodies.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid identifier '{raw}': {reason}")]
    Identifier { raw: String, reason: String },

    #[error("invalid timestamp '{raw}': {reason}")]
    Timestamp { raw: String, reason: String },
}

const HYPHENATED_LEN: usize = 36;
/// Length of the `YYYY-MM-DD` prefix.
const DATE_LEN: usize = 10;

/// Accepted timestamp layouts. The service only speaks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// RFC-3339 with optional fractional seconds (up to nanoseconds).
    Rfc3339Nano,
}

/// Parse a canonical hyphenated UUID (36 characters).
pub fn parse_identifier(raw: &str) -> Result<Uuid, ValidationError> {
    if raw.len() != HYPHENATED_LEN {
        return Err(ValidationError::Identifier {
            raw: raw.to_string(),
            reason: format!("expected {HYPHENATED_LEN} characters, found {}", raw.len()),
        });
    }

    Uuid::try_parse(raw).map_err(|e| ValidationError::Identifier {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a timestamp under `format`, normalized to UTC.
pub fn parse_timestamp(raw: &str, format: TimestampFormat) -> Result<DateTime<Utc>, ValidationError> {
    let invalid = |reason: String| ValidationError::Timestamp {
        raw: raw.to_string(),
        reason,
    };
    match format {
        TimestampFormat::Rfc3339Nano => {
            // chrono also takes a space or lowercase `t` separator and a lowercase `z`.
            if raw.as_bytes().get(DATE_LEN) != Some(&b'T') {
                return Err(invalid(format!("expected 'T' at byte {DATE_LEN}")));
            }
            if raw.contains('z') {
                return Err(invalid("UTC designator must be 'Z'".into()));
            }
            DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| invalid(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn identifier_accepts_canonical_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_identifier(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn identifier_rejects_garbage() {
        let err = parse_identifier("not-a-uuid").unwrap_err();
        assert!(matches!(err, ValidationError::Identifier { .. }));
        assert!(parse_identifier("").is_err());
        assert!(parse_identifier("0123456789abcdef0123456789abcdef").is_err());
        assert!(parse_identifier("0123456789ab-cdef-0123-4567-89abcdef0").is_err());
    }

    #[test]
    fn timestamp_keeps_nanoseconds() {
        let ts = parse_timestamp("2024-03-01T12:00:00.123456789Z", TimestampFormat::Rfc3339Nano).unwrap();
        assert_eq!(ts.nanosecond(), 123_456_789);
    }

    #[test]
    fn timestamp_normalizes_offsets() {
        let a = parse_timestamp("2024-03-01T14:00:00.5+02:00", TimestampFormat::Rfc3339Nano).unwrap();
        let b = parse_timestamp("2024-03-01T12:00:00.500000000Z", TimestampFormat::Rfc3339Nano).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn timestamp_rejects_other_layouts() {
        assert!(parse_timestamp("2024-03-01 12:00:00", TimestampFormat::Rfc3339Nano).is_err());
        assert!(parse_timestamp("1709294400", TimestampFormat::Rfc3339Nano).is_err());
        assert!(parse_timestamp("", TimestampFormat::Rfc3339Nano).is_err());
    }

    #[test]
    fn timestamp_requires_uppercase_designators() {
        for raw in [
            "2024-03-01 12:00:00Z",
            "2024-03-01t12:00:00z",
            "2024-03-01t12:00:00Z",
            "2024-03-01T12:00:00z",
            "2024-03-01 12:00:00.5+02:00",
        ] {
            let err = parse_timestamp(raw, TimestampFormat::Rfc3339Nano).unwrap_err();
            assert!(matches!(err, ValidationError::Timestamp { .. }), "{raw}");
        }
        assert!(parse_timestamp("2024-03-01T12:00:00Z", TimestampFormat::Rfc3339Nano).is_ok());
    }
}
