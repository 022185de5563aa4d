//! Conversions for values crossing the store boundary.
//!
//! Calendar dates travel as `YYYY-MM-DD`, timestamps as RFC 3339.

use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::ModelError;

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parse a `YYYY-MM-DD` calendar date.
///
/// A trailing time component (`2024-03-01T00:00:00`) is ignored, which is how
/// some stores render `date` columns cast from timestamps.
pub fn parse_date(value: &str) -> Result<Date, ModelError> {
    let head = value.split('T').next().unwrap_or(value);
    Date::parse(head, format_description!("[year]-[month]-[day]")).map_err(|e| {
        ModelError::InvalidDate {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })
}

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    // Rfc3339 only fails for years outside 0..=9999.
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, ModelError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| ModelError::InvalidTimestamp {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) mod date_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod timestamp_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S>(ts: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(*ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
