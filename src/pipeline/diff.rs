//! Diff calculation between the known id set and a fresh snapshot.
//!
//! Classifies every identifier as new, unchanged or absent. The reconciler
//! uses `absent` as its removal candidates; whether a candidate actually
//! produces a notification depends on its stored availability.

use std::collections::{BTreeSet, HashSet};

/// Identifier-level diff of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Observed but never stored, in feed order
    pub added: Vec<String>,
    /// Observed and already stored, in feed order
    pub unchanged: Vec<String>,
    /// Stored but not observed, sorted
    pub absent: Vec<String>,
}

/// Calculate the diff between the ids known before this cycle and the ids
/// observed in it.
///
/// Duplicate observed ids are reported once.
pub fn calculate_diff<'a, I>(known: &BTreeSet<String>, observed: I) -> SnapshotDiff
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut diff = SnapshotDiff::default();

    for id in observed {
        if !seen.insert(id) {
            continue;
        }
        if known.contains(id) {
            diff.unchanged.push(id.to_string());
        } else {
            diff.added.push(id.to_string());
        }
    }

    diff.absent = known
        .iter()
        .filter(|id| !seen.contains(id.as_str()))
        .cloned()
        .collect();

    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_changes() {
        let result = calculate_diff(&known(&["001", "002"]), ["002", "001"]);
        assert!(result.added.is_empty());
        assert!(result.absent.is_empty());
        assert_eq!(result.unchanged, vec!["002", "001"]);
    }

    #[test]
    fn test_additions() {
        let result = calculate_diff(&known(&["001"]), ["001", "002", "003"]);
        assert_eq!(result.added, vec!["002", "003"]);
        assert!(result.absent.is_empty());
    }

    #[test]
    fn test_removals() {
        let result = calculate_diff(&known(&["001", "002"]), ["001"]);
        assert_eq!(result.absent, vec!["002"]);
        assert!(result.added.is_empty());
    }

    #[test]
    fn test_mixed_changes() {
        let result = calculate_diff(&known(&["001", "002", "003"]), ["001", "004", "002"]);
        assert_eq!(result.added, vec!["004"]);
        assert_eq!(result.unchanged, vec!["001", "002"]);
        assert_eq!(result.absent, vec!["003"]);
    }

    #[test]
    fn test_duplicates_reported_once() {
        let result = calculate_diff(&known(&[]), ["005", "005", "006"]);
        assert_eq!(result.added, vec!["005", "006"]);
    }

    #[test]
    fn test_empty_to_full() {
        let result = calculate_diff(&known(&[]), ["001"]);
        assert_eq!(result.added.len(), 1);
        assert!(result.absent.is_empty());
    }

    #[test]
    fn test_full_to_empty() {
        let result = calculate_diff(&known(&["001", "002"]), std::iter::empty::<&str>());
        assert!(result.added.is_empty());
        assert_eq!(result.absent, vec!["001", "002"]);
    }

    #[test]
    fn test_observed_never_absent() {
        let prev = known(&["a", "b", "c", "d"]);
        let observed = ["d", "b", "x"];
        let result = calculate_diff(&prev, observed);
        for id in observed {
            assert!(!result.absent.iter().any(|a| a == id));
        }
        assert_eq!(result.absent, vec!["a", "c"]);
    }
}
