//! Serde adapter for API dates.
//!
//! The API sends either a plain `YYYY-MM-DD` or a full RFC 3339 timestamp.
//! Timestamps keep the calendar date as written in their own offset so a
//! transaction never moves into a neighbouring month. Dates go back out as
//! `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serializer};

const FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive()))
        .or_else(|| date_prefix(s))
}

/// The date part of a `YYYY-MM-DDThh:mm` or `YYYY-MM-DD hh:mm` value.
fn date_prefix(s: &str) -> Option<NaiveDate> {
    let date = s.get(..10)?;
    match s.as_bytes().get(10) {
        Some(b'T' | b' ') => NaiveDate::parse_from_str(date, FORMAT).ok(),
        _ => None,
    }
}

pub(crate) fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.format(FORMAT).to_string())
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

pub(crate) mod option {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => super::serialize(d, s),
            None => s.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}"))),
            None => Ok(None),
        }
    }
}
