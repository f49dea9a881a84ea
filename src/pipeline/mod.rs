//! Pipeline stages for one reconciliation cycle.
//!
//! - `parse`: Decode raw feed bytes into a snapshot
//! - `diff`: Classify ids as new, unchanged or absent
//! - `reconcile`: Apply the diff to the store and announce transitions
//! - `poll`: Repeat fetch → parse → reconcile on a fixed interval

pub mod diff;
pub mod parse;
pub mod poll;
pub mod reconcile;

pub use diff::{SnapshotDiff, calculate_diff};
pub use parse::{Snapshot, parse_snapshot};
pub use poll::{PollLoop, PollSummary};
pub use reconcile::{CycleReport, Reconciler};
