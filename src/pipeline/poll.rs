// src/pipeline/poll.rs

//! Fixed-interval poll loop.

use std::time::Duration;

use crate::error::Result;
use crate::models::{Config, FilterConfig};
use crate::pipeline::parse::parse_snapshot;
use crate::pipeline::reconcile::{CycleReport, Reconciler};
use crate::services::{FeedSource, Notifier};
use crate::storage::RecordStore;
use crate::utils::shutdown::Shutdown;

/// Totals for a finished poll loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub cycles: usize,
    pub failed_cycles: usize,
}

/// Runs reconciliation cycles one after another until shutdown.
pub struct PollLoop<'a, S: RecordStore + ?Sized> {
    feed: &'a dyn FeedSource,
    store: &'a S,
    notifier: &'a dyn Notifier,
    filter: FilterConfig,
    interval: Duration,
}

impl<'a, S: RecordStore + ?Sized> PollLoop<'a, S> {
    pub fn new(
        feed: &'a dyn FeedSource,
        store: &'a S,
        notifier: &'a dyn Notifier,
        interval: Duration,
    ) -> Self {
        Self {
            feed,
            store,
            notifier,
            filter: FilterConfig::default(),
            interval,
        }
    }

    /// Build a loop using the interval and filter from `config`.
    pub fn from_config(
        config: &Config,
        feed: &'a dyn FeedSource,
        store: &'a S,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self::new(feed, store, notifier, config.poll.interval()).with_filter(config.filter.clone())
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Fetch, parse and reconcile once.
    pub async fn run_once(&self) -> Result<CycleReport> {
        let body = self.feed.fetch().await?;
        self.process(&body).await
    }

    /// Parse and reconcile an already-fetched body.
    ///
    /// A body that does not parse leaves the store untouched.
    pub async fn process(&self, body: &[u8]) -> Result<CycleReport> {
        let snapshot = parse_snapshot(body)?;
        if snapshot.rejected > 0 {
            log::warn!(
                "{} of {} feed entries could not be read",
                snapshot.rejected,
                snapshot.rejected + snapshot.animals.len()
            );
        }

        let report = Reconciler::new(self.store, self.notifier)
            .with_filter(self.filter.clone())
            .reconcile(&snapshot.animals)
            .await?;

        let level = if report.has_changes() {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        log::log!(
            level,
            "Cycle complete: {} observed, {} added, {} removed, {} unchanged",
            report.observed,
            report.added.len(),
            report.removed.len(),
            report.unchanged
        );
        Ok(report)
    }

    /// Loop until `shutdown` fires.
    ///
    /// Shutdown interrupts an in-flight fetch or the sleep between cycles; a
    /// reconciliation that has started always runs to completion.
    pub async fn run(&self, mut shutdown: Shutdown) -> PollSummary {
        let mut summary = PollSummary::default();
        log::info!(
            "Polling {} every {}s",
            self.feed.describe(),
            self.interval.as_secs()
        );

        while !shutdown.is_triggered() {
            let fetched = tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                fetched = self.feed.fetch() => fetched,
            };

            summary.cycles += 1;
            let outcome = match fetched {
                Ok(body) => self.process(&body).await,
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                summary.failed_cycles += 1;
                log::error!("Cycle {} skipped: {}", summary.cycles, e);
            }

            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        log::info!(
            "Poll loop stopped after {} cycles ({} failed)",
            summary.cycles,
            summary.failed_cycles
        );
        summary
    }
}
