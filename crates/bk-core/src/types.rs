//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage and display format for naive timestamps.
///
/// Fixed width, so lexicographic order matches chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Accepted input layouts, tried in order after RFC 3339.
const INPUT_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Validation errors for submitted values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value was missing or blank.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A timestamp could not be parsed.
    #[error("invalid {field} timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    /// An interval whose end does not come after its start.
    #[error("end time {end} must be after start time {start}")]
    EndNotAfterStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// An identifier that is not an integer.
    #[error("invalid {field}: {value}")]
    InvalidId { field: &'static str, value: String },
}

/// Generates an integer ID newtype with common trait implementations.
macro_rules! define_int_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw row identifier.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw row identifier.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                trimmed
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidId {
                        field: $field_name,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_int_id!(
    /// Identifier of a stored event.
    EventId, "event"
);

define_int_id!(
    /// Identifier of a stored resource.
    ResourceId, "resource"
);

/// Parses a submitted timestamp.
///
/// Accepts ISO 8601 with a `T` or space separator, with or without seconds.
/// RFC 3339 values carrying an offset are converted to UTC. Sub-second
/// precision is truncated.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc().trunc_subsecs(0));
    }

    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|dt| dt.trunc_subsecs(0))
        .ok_or_else(|| ValidationError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

/// Parses a report bound: either a full timestamp or a plain date.
///
/// A plain date means midnight at the start of that day.
pub fn parse_date_or_timestamp(
    field: &'static str,
    value: &str,
) -> Result<NaiveDateTime, ValidationError> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    parse_timestamp(field, value)
}

/// Formats a timestamp in [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
