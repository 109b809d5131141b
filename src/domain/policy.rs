use serde::Deserialize;

/// What to do with a feed record that has no usable identity or date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRecordPolicy {
    /// Fail the whole run; nothing gets persisted.
    #[default]
    Abort,
    /// Drop the record and keep going (reported back to the caller).
    Skip,
}
