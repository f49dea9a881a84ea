// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains the feed, persistence and configuration types used
//! throughout the application.

mod animal;
mod config;
mod record;

// Re-export all public types
pub use animal::{Animal, FeedEntry};
pub use config::{
    Config, FeedConfig, FilterConfig, LoggingConfig, NotifierConfig, PollConfig, StorageConfig,
    env,
};
pub use record::{Announcement, TrackedRecord};
