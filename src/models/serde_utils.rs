//! Serde helpers for the FINVO wire format.
//!
//! The API speaks JSON numbers for money and naive ISO-8601 timestamps.

/// `Decimal` <-> JSON number. Also accepts a numeric string on input.
pub mod decimal_as_number {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(i64),
        Float(f64),
        Str(String),
    }

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let f = value
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom(format!("amount out of range: {}", value)))?;
        serializer.serialize_f64(f)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Int(i) => Ok(Decimal::from(i)),
            // Round-trip through the shortest decimal repr so 0.1 stays 0.1
            NumberOrString::Float(f) => {
                Decimal::from_str(&f.to_string()).map_err(serde::de::Error::custom)
            }
            NumberOrString::Str(s) => Decimal::from_str(s.trim()).map_err(serde::de::Error::custom),
        }
    }
}

/// `NaiveDateTime` from the timestamp shapes the API emits.
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s)))
    }
}
