#![forbid(unsafe_code)]

//! Calorie estimation and summary engine for the runkcal tracker.
//!
//! This crate provides:
//! - Domain types (settings, run records, summaries)
//! - Input normalization
//! - MET, BMR and per-run calorie estimates
//! - Daily and monthly summaries
//! - Storage collaborators (settings file, record log, CSV archive)
//! - The `Tracker` service tying them together

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod normalize;
pub mod met;
pub mod bmr;
pub mod calories;
pub mod settings;
pub mod summary;
pub mod store;
pub mod settings_store;
pub mod record_log;
pub mod archive;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use normalize::DateInput;
pub use calories::estimate_calories;
pub use bmr::estimate_bmr;
pub use met::resolve_met;
pub use settings::SettingsUpdate;
pub use summary::{compute_daily_summary, compute_monthly_summary};
pub use store::{MemoryStore, RecordLog, SettingsStore};
pub use tracker::{FileTracker, RunPayload, Tracker};
pub use chrono_tz::Tz;
