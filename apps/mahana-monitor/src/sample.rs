use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical decimal text of a reading, e.g. `"36.60"`.
///
/// Temperatures stay text end to end so trailing zeros survive the trip
/// through JSON and Postgres NUMERIC instead of collapsing to the nearest
/// f64. Serializes as a JSON string; accepts a string or a bare number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Temperature(String);

impl Temperature {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| anyhow!("invalid temperature {trimmed:?}"))?;
        if !value.is_finite() {
            return Err(anyhow!("non-finite temperature {trimmed:?}"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Renders with two decimal places, the resolution the probe reports at.
    pub fn from_celsius(value: f64) -> Self {
        Self(format!("{value:.2}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Temperature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Temperature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Temperature::parse(&text).map_err(D::Error::custom),
            Raw::Number(value) => {
                if !value.is_finite() {
                    return Err(D::Error::custom("non-finite temperature"));
                }
                Ok(Temperature(format!("{value}")))
            }
        }
    }
}

/// One probe reading. A failed read still produces a sample, with no
/// temperature; the file sink records it, the batch sink drops it.
#[derive(Debug, Clone)]
pub struct Sample {
    pub taken_at: DateTime<Utc>,
    pub temperature: Option<Temperature>,
    pub sensor: String,
}

/// One `[timestamp, temperature]` pair as it goes over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePoint(pub DateTime<Utc>, pub Temperature);

/// Accepts RFC 3339 as well as the naive formats older CSV dumps used.
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(anyhow!("unparseable timestamp {trimmed:?}"))
}
