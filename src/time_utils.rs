// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and ranges.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Closed interval `[start, end]` of instants.
///
/// An inverted range (`end < start`) is valid and contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Parse an ISO 8601 query value.
///
/// Accepts RFC 3339 with any offset, a naive date-time (taken as UTC) or a
/// bare date (midnight UTC).
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapters that read request body dates with [`parse_iso8601`], so a
/// body accepts the same spellings as a query string.
///
/// Use with `#[serde(deserialize_with = "...")]`; serialization is unchanged.
pub mod iso8601 {
    use super::parse_iso8601;
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    fn parse<E: Error>(raw: &str) -> Result<DateTime<Utc>, E> {
        parse_iso8601(raw).ok_or_else(|| E::custom(format!("invalid datetime: {raw}")))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
    }

    /// `null` or absent (with `#[serde(default)]`) is `None`.
    pub fn option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw))
            .transpose()
    }

    /// Three-state form for partial updates: absent is `None`, `null` is
    /// `Some(None)`.
    pub fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        option(deserializer).map(Some)
    }
}
