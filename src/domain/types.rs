use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised by the pure change-detection core.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("invalid date {value:?}: {reason} (expected dd.mm.yyyy)")]
    DateParse { value: String, reason: String },

    #[error("feed record {index} is malformed: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("inconsistent change record: {0}")]
    FormatInconsistency(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    New,
    Deleted,
    Modified,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::New => "New",
            ChangeKind::Deleted => "Deleted",
            ChangeKind::Modified => "Modified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "New" => Some(ChangeKind::New),
            "Deleted" => Some(ChangeKind::Deleted),
            "Modified" => Some(ChangeKind::Modified),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
