// src/pipeline/parse.rs

//! Snapshot parsing.
//!
//! The feed is a JSON array of `{"AdoptableSearch": {...}}` objects. A payload
//! that is not an array is rejected as a whole so the cycle can be skipped.
//! Individual entries that cannot be decoded are dropped with a warning.

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Animal, FeedEntry};

/// Result of decoding one snapshot.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Animals decoded from the payload, in feed order
    pub animals: Vec<Animal>,
    /// Entries that could not be decoded
    pub rejected: usize,
}

/// Decode raw feed bytes into a snapshot.
pub fn parse_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::parse(format!("invalid JSON: {e}")))?;

    let entries = match root {
        Value::Array(entries) => entries,
        other => {
            return Err(AppError::parse(format!(
                "expected a top-level array, found {}",
                kind_of(&other)
            )));
        }
    };

    let mut snapshot = Snapshot {
        animals: Vec::with_capacity(entries.len()),
        rejected: 0,
    };

    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<FeedEntry>(entry) {
            Ok(entry) => snapshot.animals.push(entry.adoptable_search),
            Err(e) => {
                log::warn!("Skipping feed entry #{}: {}", index, e);
                snapshot.rejected += 1;
            }
        }
    }

    Ok(snapshot)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
