//! Shared wire shapes
//!
//! The API wraps collections as `{"$values": [...]}` and pages as an envelope
//! around such a wrapper. Timestamps may arrive with or without an offset;
//! offset-less values are read as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// == Values Wrapper ==
/// Collection wrapped as `{"$values": [...]}`. A bare JSON array is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuesWrapper<T> {
    #[serde(rename = "$values")]
    pub values: Vec<T>,
}

impl<T> Default for ValuesWrapper<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T> From<ValuesWrapper<T>> for Vec<T> {
    fn from(wrapper: ValuesWrapper<T>) -> Self {
        wrapper.values
    }
}

impl<T> From<Vec<T>> for ValuesWrapper<T> {
    fn from(values: Vec<T>) -> Self {
        Self { values }
    }
}

impl<'de, T> Deserialize<'de> for ValuesWrapper<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Wrapped {
                #[serde(rename = "$values")]
                values: Vec<T>,
            },
            Plain(Vec<T>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Wrapped { values } | Repr::Plain(values) => Self { values },
        })
    }
}

// == Paged Envelope ==
/// Page as sent by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagedEnvelope<T> {
    pub items: ValuesWrapper<T>,
    pub total_count: u64,
    pub total_pages: u32,
    pub page_number: u32,
    pub current_page: u32,
    pub page_size: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Default for PagedEnvelope<T> {
    fn default() -> Self {
        Self {
            items: ValuesWrapper::default(),
            total_count: 0,
            total_pages: 0,
            page_number: 1,
            current_page: 1,
            page_size: 0,
            has_previous_page: false,
            has_next_page: false,
        }
    }
}

// == Paged Response ==
/// One page of results with its position in the full listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u32,
    pub page_number: u32,
    pub current_page: u32,
    pub page_size: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Default for PagedResponse<T> {
    fn default() -> Self {
        PagedEnvelope::default().into()
    }
}

impl<T> From<PagedEnvelope<T>> for PagedResponse<T> {
    fn from(envelope: PagedEnvelope<T>) -> Self {
        Self {
            items: envelope.items.values,
            total_count: envelope.total_count,
            total_pages: envelope.total_pages,
            page_number: envelope.page_number,
            current_page: envelope.current_page,
            page_size: envelope.page_size,
            has_previous_page: envelope.has_previous_page,
            has_next_page: envelope.has_next_page,
        }
    }
}

// == Timestamps ==
/// Parses an RFC 3339 timestamp, or an offset-less one as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        })
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Serde adapter for required timestamps.
pub mod timestamp {
    use super::*;
    use serde::{de, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(de::Error::custom)
    }
}

/// Serde adapter for nullable timestamps.
pub mod option_timestamp {
    use super::*;
    use serde::{de, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&format_timestamp(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_timestamp(&raw).map_err(de::Error::custom))
            .transpose()
    }
}
