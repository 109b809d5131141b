use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::CoreError;

pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// One scheduled assembly as published in the feed.
///
/// The feed is not schema-validated, so every field is optional here and
/// required-ness is enforced when the identity is derived. Fields the
/// watcher does not interpret are kept in `extra` so a stored snapshot
/// keeps everything the feed sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "datum", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "von", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub start_location: Option<String>,
    #[serde(rename = "thema", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(rename = "plz", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(rename = "strasse_nr", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    /// `None` means no route has been published yet; distinct from `Some("")`.
    #[serde(rename = "aufzugsstrecke", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub route_description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `(date, start_location, topic)` triple that identifies an event
/// across snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventIdentity {
    pub date: String,
    pub start_location: String,
    pub topic: String,
}

impl fmt::Display for EventIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.date, self.start_location, self.topic)
    }
}

impl EventRecord {
    pub fn identity(&self) -> Result<EventIdentity, CoreError> {
        Ok(EventIdentity {
            date: required(&self.date, "date")?.to_string(),
            start_location: required(&self.start_location, "start_location")?.to_string(),
            topic: required(&self.topic, "topic")?.to_string(),
        })
    }

    /// Identity key, e.g. `01.05.2099_Alexanderplatz_Demo`.
    pub fn make_key(&self) -> Result<String, CoreError> {
        self.identity().map(|id| id.to_string())
    }

    /// Decodes the `index`-th entry of a feed list.
    pub fn from_value(index: usize, value: Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(|e| CoreError::MalformedRecord {
            index,
            reason: e.to_string(),
        })
    }

    pub fn parsed_date(&self) -> Result<NaiveDate, CoreError> {
        let raw = required(&self.date, "date")?;
        NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| CoreError::DateParse {
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// True iff the event day (at midnight) lies strictly after `now`.
    pub fn is_future(&self, now: NaiveDateTime) -> Result<bool, CoreError> {
        let date = self.parsed_date()?;
        Ok(date.and_time(NaiveTime::MIN) > now)
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, CoreError> {
    value
        .as_deref()
        .ok_or(CoreError::MissingField { field })
}

// The feed occasionally ships postal codes as numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, got {other}"
        ))),
    }
}
