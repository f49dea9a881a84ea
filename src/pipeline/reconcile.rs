// src/pipeline/reconcile.rs

//! Reconciliation of an observed snapshot against the record store.
//!
//! One call runs both passes of a cycle:
//!
//! 1. **Ingest**: every usable observed animal is inserted if its id is new,
//!    and each insertion is announced as available.
//! 2. **Removal**: every id that was known *before* ingest but is missing
//!    from the snapshot is flipped to unavailable, and announced, if it was
//!    still available.
//!
//! The known-id set is captured before ingest; otherwise everything observed
//! would already be "known" and nothing could ever be found missing.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Animal, Announcement, FilterConfig};
use crate::pipeline::diff::calculate_diff;
use crate::services::Notifier;
use crate::storage::RecordStore;

/// Outcome of one reconciliation.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Animals in the snapshot, including skipped ones
    pub observed: usize,
    /// Ids inserted this cycle
    pub added: Vec<String>,
    /// Ids flipped to unavailable this cycle
    pub removed: Vec<String>,
    /// Observed ids that were already stored
    pub unchanged: usize,
    /// Entries without a usable id
    pub skipped: usize,
    /// Entries rejected by the eligibility filter
    pub ineligible: usize,
    /// Announcements that could not be delivered
    pub notify_failures: usize,
}

impl CycleReport {
    fn begin(observed: usize) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            observed,
            added: Vec::new(),
            removed: Vec::new(),
            unchanged: 0,
            skipped: 0,
            ineligible: 0,
            notify_failures: 0,
        }
    }

    /// Check if the store changed.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Drives the record store and notifier for one snapshot.
pub struct Reconciler<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    notifier: &'a dyn Notifier,
    filter: FilterConfig,
}

impl<'a, S: RecordStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S, notifier: &'a dyn Notifier) -> Self {
        Self {
            store,
            notifier,
            filter: FilterConfig::default(),
        }
    }

    /// Apply an eligibility filter before ingest.
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Reconcile the store against `observed`.
    ///
    /// Store failures abort the reconciliation and are returned; mutations
    /// already applied stay applied. Notification failures are logged and
    /// counted only.
    pub async fn reconcile(&self, observed: &[Animal]) -> Result<CycleReport> {
        let mut report = CycleReport::begin(observed.len());

        let known = self.store.all_known_ids()?;

        let usable: Vec<&Animal> = observed
            .iter()
            .filter(|animal| {
                if animal.has_id() {
                    return true;
                }
                log::warn!(
                    "Skipping animal without an id (name: {:?}, age: {:?})",
                    animal.name,
                    animal.age
                );
                false
            })
            .collect();
        report.skipped = observed.len() - usable.len();

        // Ineligible animals still count as observed, so they are never
        // reported as gone while the feed lists them.
        let diff = calculate_diff(&known, usable.iter().map(|a| a.id.as_str()));
        report.unchanged = diff.unchanged.len();

        // Pass 1: ingest
        for animal in &usable {
            if !self.filter.is_eligible(animal) {
                log::debug!(
                    "Ignoring {} ({}): age {:?} exceeds filter",
                    animal.name,
                    animal.id,
                    animal.age
                );
                report.ineligible += 1;
                continue;
            }

            if self
                .store
                .upsert_if_absent(&animal.id, &animal.name, &animal.age)?
            {
                log::info!("Inserting animal {} ({})", animal.name, animal.id);
                report.added.push(animal.id.clone());
                let announcement = Announcement::Available {
                    id: animal.id.clone(),
                    name: animal.name.clone(),
                };
                self.announce(&announcement, &mut report).await;
            }
        }

        // Pass 2: removal
        for id in &diff.absent {
            match self.store.is_available(id) {
                Ok(true) => {}
                Ok(false) | Err(AppError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }

            // A failed read must leave the record available.
            let name = self.store.name_of(id)?;
            self.store.mark_unavailable(id)?;
            log::info!("{} ({}) is no longer available", name, id);
            report.removed.push(id.clone());

            let announcement = Announcement::Unavailable {
                id: id.clone(),
                name,
            };
            self.announce(&announcement, &mut report).await;
        }

        report.finished_at = Utc::now();
        Ok(report)
    }

    async fn announce(&self, announcement: &Announcement, report: &mut CycleReport) {
        let message = announcement.to_string();
        if let Err(e) = self.notifier.notify(&message).await {
            log::error!("Failed to deliver notification for {}: {}", announcement.id(), e);
            report.notify_failures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeSet;

    use async_trait::async_trait;

    use super::*;
    use crate::models::TrackedRecord;
    use crate::services::RecordingNotifier;
    use crate::storage::{MemoryStore, SqliteStore};

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _message: &str) -> Result<()> {
            Err(AppError::notify("webhook unreachable"))
        }
    }

    /// Fails every store call after the known-id read.
    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn upsert_if_absent(&self, _: &str, _: &str, _: &str) -> Result<bool> {
            Err(AppError::Store(rusqlite::Error::InvalidQuery))
        }
        fn mark_unavailable(&self, _: &str) -> Result<()> {
            Err(AppError::Store(rusqlite::Error::InvalidQuery))
        }
        fn is_available(&self, _: &str) -> Result<bool> {
            Err(AppError::Store(rusqlite::Error::InvalidQuery))
        }
        fn name_of(&self, _: &str) -> Result<String> {
            Err(AppError::Store(rusqlite::Error::InvalidQuery))
        }
        fn all_known_ids(&self) -> Result<BTreeSet<String>> {
            Ok(["1".to_string()].into_iter().collect())
        }
        fn records(&self) -> Result<Vec<TrackedRecord>> {
            Ok(Vec::new())
        }
    }

    /// Fails `name_of` once, then behaves like the wrapped store.
    struct FlakyNameStore {
        inner: MemoryStore,
        failed: Cell<bool>,
    }

    impl RecordStore for FlakyNameStore {
        fn upsert_if_absent(&self, id: &str, name: &str, age: &str) -> Result<bool> {
            self.inner.upsert_if_absent(id, name, age)
        }
        fn mark_unavailable(&self, id: &str) -> Result<()> {
            self.inner.mark_unavailable(id)
        }
        fn is_available(&self, id: &str) -> Result<bool> {
            self.inner.is_available(id)
        }
        fn name_of(&self, id: &str) -> Result<String> {
            if !self.failed.replace(true) {
                return Err(AppError::Store(rusqlite::Error::InvalidQuery));
            }
            self.inner.name_of(id)
        }
        fn all_known_ids(&self) -> Result<BTreeSet<String>> {
            self.inner.all_known_ids()
        }
        fn records(&self) -> Result<Vec<TrackedRecord>> {
            self.inner.records()
        }
    }

    /// Lists an id it cannot answer for.
    struct DanglingIdStore;

    impl RecordStore for DanglingIdStore {
        fn upsert_if_absent(&self, _: &str, _: &str, _: &str) -> Result<bool> {
            Ok(false)
        }
        fn mark_unavailable(&self, id: &str) -> Result<()> {
            panic!("mark_unavailable called for {id}");
        }
        fn is_available(&self, id: &str) -> Result<bool> {
            Err(AppError::not_found(id))
        }
        fn name_of(&self, id: &str) -> Result<String> {
            Err(AppError::not_found(id))
        }
        fn all_known_ids(&self) -> Result<BTreeSet<String>> {
            Ok(["ghost".to_string()].into_iter().collect())
        }
        fn records(&self) -> Result<Vec<TrackedRecord>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_duplicate_in_snapshot_announced_once() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let observed = vec![Animal::new("1", "Rex", "2"), Animal::new("1", "Rex", "2")];

        let report = Reconciler::new(&store, &notifier)
            .reconcile(&observed)
            .await
            .unwrap();

        assert_eq!(report.added, vec!["1"]);
        assert_eq!(store.len(), 1);
        assert_eq!(notifier.messages(), vec!["Rex (1) is now available"]);
    }

    #[tokio::test]
    async fn test_empty_id_is_skipped() {
        let store = MemoryStore::new().with_record("7", "Biscuit", "1", true);
        let notifier = RecordingNotifier::new();
        let observed = vec![
            Animal::new("", "Nameless", "3"),
            Animal::new("  ", "Blank", "4"),
            Animal::new("7", "Biscuit", "1"),
        ];

        let report = Reconciler::new(&store, &notifier)
            .reconcile(&observed)
            .await
            .unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report.unchanged, 1);
        assert!(!report.has_changes());
        assert!(store.get("").is_none());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_empty_ids_do_not_mask_removals() {
        let store = MemoryStore::new().with_record("7", "Biscuit", "1", true);
        let notifier = RecordingNotifier::new();

        Reconciler::new(&store, &notifier)
            .reconcile(&[Animal::new("", "Nameless", "3")])
            .await
            .unwrap();

        assert!(!store.is_available("7").unwrap());
        assert_eq!(notifier.messages(), vec!["Biscuit (7) is no longer available"]);
    }

    #[tokio::test]
    async fn test_removal_fires_once() {
        let store = MemoryStore::new().with_record("1", "Rex", "2", true);
        let notifier = RecordingNotifier::new();
        let reconciler = Reconciler::new(&store, &notifier);

        reconciler.reconcile(&[]).await.unwrap();
        let second = reconciler.reconcile(&[]).await.unwrap();

        assert!(second.removed.is_empty());
        assert_eq!(notifier.messages(), vec!["Rex (1) is no longer available"]);
    }

    #[tokio::test]
    async fn test_reappearance_is_not_reactivated() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let reconciler = Reconciler::new(&store, &notifier);
        let rex = [Animal::new("1", "Rex", "2")];

        reconciler.reconcile(&rex).await.unwrap();
        reconciler.reconcile(&[]).await.unwrap();
        let third = reconciler.reconcile(&rex).await.unwrap();

        assert!(!third.has_changes());
        assert!(!store.is_available("1").unwrap());
        assert_eq!(notifier.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_mutations() {
        let store = MemoryStore::new().with_record("2", "Fido", "4", true);
        let notifier = FailingNotifier;

        let report = Reconciler::new(&store, &notifier)
            .reconcile(&[Animal::new("1", "Rex", "2")])
            .await
            .unwrap();

        assert_eq!(report.notify_failures, 2);
        assert!(store.is_available("1").unwrap());
        assert!(!store.is_available("2").unwrap());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_cycle() {
        let notifier = RecordingNotifier::new();
        let err = Reconciler::new(&BrokenStore, &notifier)
            .reconcile(&[Animal::new("2", "Fido", "4")])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Store(_)));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_removal_is_retried_next_cycle() {
        let store = FlakyNameStore {
            inner: MemoryStore::new().with_record("1", "Rex", "2", true),
            failed: Cell::new(false),
        };
        let notifier = RecordingNotifier::new();
        let reconciler = Reconciler::new(&store, &notifier);

        let err = reconciler.reconcile(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert!(store.is_available("1").unwrap());

        let report = reconciler.reconcile(&[]).await.unwrap();
        assert_eq!(report.removed, vec!["1"]);
        assert!(!store.is_available("1").unwrap());
        assert_eq!(notifier.messages(), vec!["Rex (1) is no longer available"]);
    }

    #[tokio::test]
    async fn test_unknown_removal_candidate_is_ignored() {
        let notifier = RecordingNotifier::new();

        let report = Reconciler::new(&DanglingIdStore, &notifier)
            .reconcile(&[])
            .await
            .unwrap();

        assert!(report.removed.is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_ineligible_animals_are_not_tracked_or_removed() {
        let store = MemoryStore::new().with_record("old", "Grandpa", "2 years", true);
        let notifier = RecordingNotifier::new();
        let filter = FilterConfig {
            max_age_years: Some(5),
        };

        let report = Reconciler::new(&store, &notifier)
            .with_filter(filter)
            .reconcile(&[
                Animal::new("old", "Grandpa", "9 years"),
                Animal::new("new", "Senior", "12 years"),
                Animal::new("pup", "Pup", "3 months"),
            ])
            .await
            .unwrap();

        assert_eq!(report.ineligible, 2);
        assert_eq!(report.added, vec!["pup"]);
        assert!(report.removed.is_empty());
        assert!(store.get("new").is_none());
        assert!(store.is_available("old").unwrap());
    }

    #[tokio::test]
    async fn test_works_against_sqlite() {
        let store = SqliteStore::open_in_memory().unwrap();
        let notifier = RecordingNotifier::new();
        let reconciler = Reconciler::new(&store, &notifier);

        reconciler
            .reconcile(&[Animal::new("1", "Rex", "2"), Animal::new("2", "Fido", "4")])
            .await
            .unwrap();
        let report = reconciler
            .reconcile(&[Animal::new("2", "Fido", "4"), Animal::new("3", "Luna", "1")])
            .await
            .unwrap();

        assert_eq!(report.added, vec!["3"]);
        assert_eq!(report.removed, vec!["1"]);
        assert_eq!(report.unchanged, 1);
        assert_eq!(
            notifier.messages(),
            vec![
                "Rex (1) is now available",
                "Fido (2) is now available",
                "Luna (3) is now available",
                "Rex (1) is no longer available",
            ]
        );
    }
}
