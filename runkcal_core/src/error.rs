//! Error types for the runkcal_core library.
//!
//! The calculation engine itself never fails; these errors come from the
//! storage collaborators and configuration loading.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for runkcal_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings or record store error
    #[error("Store error: {0}")]
    Store(String),

    /// A stored run record that cannot be read back
    #[error("Invalid run record: {0}")]
    InvalidRecord(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
