//! Service layer for the watcher.
//!
//! This module contains the external collaborators:
//! - Snapshot retrieval (`FeedSource`, `HttpFeed`)
//! - Alert delivery (`Notifier`, `WebhookNotifier`, `LogNotifier`)

mod feed;
pub mod notifier;

pub use feed::{FeedSource, HttpFeed};
pub use notifier::{LogNotifier, Notifier, RecordingNotifier, WebhookNotifier};
