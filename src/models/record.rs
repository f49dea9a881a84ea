//! Persisted record and announcement types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Persisted counterpart of an [`Animal`](super::Animal).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedRecord {
    /// Shelter identifier (primary key)
    pub id: String,

    /// Name captured at first sighting
    pub name: String,

    /// Age captured at first sighting
    pub age: String,

    /// True while the id is present in the latest snapshot
    pub available: bool,
}

/// A state transition worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// First sighting of an id
    Available { id: String, name: String },
    /// Id dropped out of the feed
    Unavailable { id: String, name: String },
}

impl Announcement {
    pub fn id(&self) -> &str {
        match self {
            Self::Available { id, .. } | Self::Unavailable { id, .. } => id,
        }
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available { id, name } => write!(f, "{name} ({id}) is now available"),
            Self::Unavailable { id, name } => write!(f, "{name} ({id}) is no longer available"),
        }
    }
}
