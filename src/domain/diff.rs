use super::{format_change, Change, KeyedSnapshot, MarkerStyle};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// One rendered entry per change, same order as `changes`.
    pub display: Vec<String>,
    pub changes: Vec<Change>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Compares two keyed snapshots.
///
/// Output order: New (new-map order), Modified (new-map order), then
/// Deleted (old-map order). Only the route of a surviving key is compared;
/// a missing route differs from an empty one.
pub fn diff(old: &KeyedSnapshot, new: &KeyedSnapshot, style: MarkerStyle) -> DiffResult {
    let added = new
        .iter()
        .filter(|entry| !old.contains_key(&entry.key))
        .map(|entry| Change::added(&entry.identity, &entry.record));

    let modified = new.iter().filter_map(|entry| {
        let before = old.get(&entry.key)?;
        (before.record.route_description != entry.record.route_description)
            .then(|| Change::route_changed(&entry.identity, &before.record, &entry.record))
    });

    let removed = old
        .iter()
        .filter(|entry| !new.contains_key(&entry.key))
        .map(|entry| Change::removed(&entry.identity, &entry.record));

    let changes: Vec<Change> = added.chain(modified).chain(removed).collect();
    let display = changes.iter().map(|c| format_change(c, style)).collect();

    DiffResult { display, changes }
}
