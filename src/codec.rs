//! Explicit decode rules for fields the API is inconsistent about.
//!
//! Timestamps arrive as epoch seconds, usually a JSON integer but sometimes a string.
//! They are decoded here by hand rather than through any generic date parsing.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Unexpected, Visitor};
use std::fmt;

/// Deserializes epoch seconds (integer or digit string) into a UTC timestamp.
pub(crate) fn epoch_seconds<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(EpochSecondsVisitor)
}

struct EpochSecondsVisitor;

impl EpochSecondsVisitor {
    fn to_timestamp<E: de::Error>(secs: i64) -> Result<DateTime<Utc>, E> {
        DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| E::custom(format!("epoch seconds out of range: {secs}")))
    }
}

impl<'de> Visitor<'de> for EpochSecondsVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("epoch seconds as an integer or a string of digits")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Self::to_timestamp(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let secs = i64::try_from(v)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))?;
        Self::to_timestamp(secs)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let secs = v
            .trim()
            .parse::<i64>()
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))?;
        Self::to_timestamp(secs)
    }
}

/// Deserializes an identifier that may be sent as a number or a string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, a number or null")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}
