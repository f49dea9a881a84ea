// src/lib.rs

//! shelterwatch library
//!
//! Polls a shelter's adoptable-animal feed, keeps a record of every animal
//! seen, and announces arrivals and departures.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
