//! Storage abstractions for tracked-record persistence.
//!
//! A record is created the first time its id is observed and flipped to
//! unavailable once it drops out of the feed. Records are never deleted.
//!
//! ## Schema
//!
//! ```text
//! animals
//! ├── id         TEXT PRIMARY KEY
//! ├── name       TEXT
//! ├── age        TEXT
//! └── available  BOOL
//! ```

pub mod memory;
pub mod sqlite;

use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::TrackedRecord;

// Re-export for convenience
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Trait for record storage backends.
///
/// Every operation is atomic with respect to a single identifier. Engine
/// failures surface as [`AppError::Store`](crate::error::AppError::Store).
pub trait RecordStore {
    /// Insert a new available record unless the id is already stored.
    ///
    /// Returns `true` only when a row was created. Existing rows are left
    /// untouched, including `name`, `age` and `available`.
    fn upsert_if_absent(&self, id: &str, name: &str, age: &str) -> Result<bool>;

    /// Flip a record to unavailable. No-op when absent or already unavailable.
    fn mark_unavailable(&self, id: &str) -> Result<()>;

    /// Current availability; `NotFound` if the id was never inserted.
    fn is_available(&self, id: &str) -> Result<bool>;

    /// Stored display name; `NotFound` if the id was never inserted.
    fn name_of(&self, id: &str) -> Result<String>;

    /// Every id ever inserted, regardless of availability.
    fn all_known_ids(&self) -> Result<BTreeSet<String>>;

    /// All records ordered by id.
    fn records(&self) -> Result<Vec<TrackedRecord>>;
}
