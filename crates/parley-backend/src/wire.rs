// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde helpers for provider payloads.
//!
//! Providers disagree on timestamp encoding: the dashboard store emits
//! RFC 3339 strings while the Meta platforms report epoch milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

fn to_datetime<E: serde::de::Error>(raw: RawTimestamp) -> Result<DateTime<Utc>, E> {
    match raw {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| E::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(s) => parse_timestamp_str(&s).map_err(E::custom),
    }
}

/// Parses RFC 3339, or a decimal epoch-milliseconds string.
pub fn parse_timestamp_str(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ms) = s.trim().parse::<i64>() {
        return Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| format!("timestamp out of range: {ms}"));
    }
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp `{s}`: {e}"))
}

/// `deserialize_with` target accepting RFC 3339 strings or epoch milliseconds.
pub fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    to_datetime(RawTimestamp::deserialize(deserializer)?)
}

/// Like [`timestamp`] for optional fields.
pub fn optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Option::<RawTimestamp>::deserialize(deserializer)?
        .map(to_datetime)
        .transpose()
}
