#![forbid(unsafe_code)]

//! Core domain model and persistence for the BMI tracker.
//!
//! This crate provides:
//! - BMI computation and classification
//! - The SQLite record store for users and measurements
//! - History and trend helpers for display
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod metric;
pub mod store;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use metric::compute;
pub use store::{Clock, RecordStore, SystemClock};
pub use history::{describe, TrendPoint, TrendSeries};
