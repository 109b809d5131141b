use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::{CoreError, EventIdentity, EventRecord, InvalidRecordPolicy};

#[derive(Clone, Debug, PartialEq)]
pub struct KeyedEntry {
    pub key: String,
    pub identity: EventIdentity,
    pub record: EventRecord,
}

/// Future-dated events of one snapshot, keyed by identity.
///
/// Iteration follows first-insertion order of each key. Re-inserting a key
/// replaces the record in place.
#[derive(Clone, Debug, Default)]
pub struct KeyedSnapshot {
    entries: Vec<KeyedEntry>,
    index: HashMap<String, usize>,
}

/// Result of the filtering pass over a raw snapshot.
#[derive(Clone, Debug, Default)]
pub struct FilterOutcome {
    pub snapshot: KeyedSnapshot,
    /// Keys seen more than once; the last record won.
    pub collisions: Vec<String>,
    /// Records dropped under [`InvalidRecordPolicy::Skip`].
    pub skipped: Vec<CoreError>,
}

impl KeyedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the records dated strictly after `now`.
    ///
    /// The date is checked before the identity, so a past record with a
    /// missing topic is simply dropped rather than reported.
    pub fn build(
        records: &[EventRecord],
        now: NaiveDateTime,
        policy: InvalidRecordPolicy,
    ) -> Result<FilterOutcome, CoreError> {
        let mut out = FilterOutcome::default();

        for record in records {
            let checked = record.is_future(now).and_then(|future| match future {
                true => record.identity().map(Some),
                false => Ok(None),
            });
            let identity = match checked {
                Ok(Some(identity)) => identity,
                Ok(None) => continue,
                Err(e) => match policy {
                    InvalidRecordPolicy::Abort => return Err(e),
                    InvalidRecordPolicy::Skip => {
                        out.skipped.push(e);
                        continue;
                    }
                },
            };

            let key = identity.to_string();
            if out.snapshot.insert(identity, record.clone()) {
                out.collisions.push(key);
            }
        }

        Ok(out)
    }

    /// Returns true when an existing entry was replaced.
    pub fn insert(&mut self, identity: EventIdentity, record: EventRecord) -> bool {
        let key = identity.to_string();
        if let Some(&pos) = self.index.get(&key) {
            let entry = &mut self.entries[pos];
            entry.identity = identity;
            entry.record = record;
            return true;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(KeyedEntry {
            key,
            identity,
            record,
        });
        false
    }

    pub fn get(&self, key: &str) -> Option<&KeyedEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyedEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
