use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical decimal text of a temperature, e.g. `"36.60"`. Postgres NUMERIC
/// rendered as text keeps the scale clients submitted, so trailing zeros
/// round-trip exactly. Serializes as a JSON string; accepts string or number.
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

    /// Text straight from a NUMERIC column; already validated by Postgres.
    pub fn from_db(text: String) -> Self {
        Self(text)
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

/// One `[timestamp, temperature]` pair as served back to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WirePoint(pub DateTime<Utc>, pub Option<Temperature>);

/// An ingested pair before its timestamp is validated. Kept separate from
/// `WirePoint` so a bad timestamp is a 400 with a usable message instead of
/// a serde rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingPoint(pub String, pub Option<Temperature>);

impl IncomingPoint {
    pub fn into_point(self) -> Result<WirePoint> {
        Ok(WirePoint(parse_timestamp(&self.0)?, self.1))
    }
}

/// Accepts RFC 3339 as well as the naive formats older clients send.
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
