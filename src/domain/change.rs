use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChangeKind, CoreError, EventIdentity, EventRecord};

/// Delta for a single identity key between two snapshots.
///
/// Serialized with an internal `type` tag; this is the archive format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Change {
    New {
        date: String,
        start_location: String,
        topic: String,
        postal_code: Option<String>,
        street_address: Option<String>,
        route_description: Option<String>,
    },
    Deleted {
        date: String,
        start_location: String,
        topic: String,
        postal_code: Option<String>,
        street_address: Option<String>,
        route_description: Option<String>,
    },
    Modified {
        date: String,
        start_location: String,
        topic: String,
        postal_code: Option<String>,
        street_address: Option<String>,
        old_route: Option<String>,
        new_route: Option<String>,
    },
}

const COMMON_FIELDS: [&str; 5] = [
    "date",
    "start_location",
    "topic",
    "postal_code",
    "street_address",
];
const LISTING_FIELDS: [&str; 1] = ["route_description"];
const ROUTE_CHANGE_FIELDS: [&str; 2] = ["old_route", "new_route"];

impl Change {
    pub fn added(id: &EventIdentity, record: &EventRecord) -> Self {
        Change::New {
            date: id.date.clone(),
            start_location: id.start_location.clone(),
            topic: id.topic.clone(),
            postal_code: record.postal_code.clone(),
            street_address: record.street_address.clone(),
            route_description: record.route_description.clone(),
        }
    }

    pub fn removed(id: &EventIdentity, record: &EventRecord) -> Self {
        Change::Deleted {
            date: id.date.clone(),
            start_location: id.start_location.clone(),
            topic: id.topic.clone(),
            postal_code: record.postal_code.clone(),
            street_address: record.street_address.clone(),
            route_description: record.route_description.clone(),
        }
    }

    /// Address fields come from the newer record.
    pub fn route_changed(id: &EventIdentity, old: &EventRecord, new: &EventRecord) -> Self {
        Change::Modified {
            date: id.date.clone(),
            start_location: id.start_location.clone(),
            topic: id.topic.clone(),
            postal_code: new.postal_code.clone(),
            street_address: new.street_address.clone(),
            old_route: old.route_description.clone(),
            new_route: new.route_description.clone(),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::New { .. } => ChangeKind::New,
            Change::Deleted { .. } => ChangeKind::Deleted,
            Change::Modified { .. } => ChangeKind::Modified,
        }
    }

    /// `(date, start_location, topic)` of the affected event.
    pub fn headline(&self) -> (&str, &str, &str) {
        match self {
            Change::New {
                date,
                start_location,
                topic,
                ..
            }
            | Change::Deleted {
                date,
                start_location,
                topic,
                ..
            }
            | Change::Modified {
                date,
                start_location,
                topic,
                ..
            } => (date.as_str(), start_location.as_str(), topic.as_str()),
        }
    }
}

/// Pretty JSON (4-space indent, UTF-8 kept as is) for a change-set archive.
pub fn encode_change_set(changes: &[Change]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    changes.serialize(&mut ser)?;
    Ok(buf)
}

/// Reads an archived change-set back, rejecting records whose `type`
/// does not match the fields they carry.
pub fn decode_change_set(bytes: &[u8]) -> Result<Vec<Change>, CoreError> {
    let values: Vec<Value> = serde_json::from_slice(bytes)
        .map_err(|e| CoreError::FormatInconsistency(format!("not a change list: {e}")))?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            check_shape(&value).map_err(|msg| {
                CoreError::FormatInconsistency(format!("record {i}: {msg}"))
            })?;
            serde_json::from_value(value)
                .map_err(|e| CoreError::FormatInconsistency(format!("record {i}: {e}")))
        })
        .collect()
}

fn check_shape(value: &Value) -> Result<(), String> {
    let obj = value.as_object().ok_or("not an object")?;
    let tag = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("missing `type` tag")?;
    let kind = ChangeKind::parse(tag).ok_or_else(|| format!("unknown type {tag:?}"))?;
    let specific: &[&str] = match kind {
        ChangeKind::New | ChangeKind::Deleted => &LISTING_FIELDS,
        ChangeKind::Modified => &ROUTE_CHANGE_FIELDS,
    };

    for field in obj.keys().filter(|k| k.as_str() != "type") {
        if !COMMON_FIELDS.contains(&field.as_str()) && !specific.contains(&field.as_str()) {
            return Err(format!("field `{field}` does not belong to a {kind} change"));
        }
    }
    Ok(())
}
