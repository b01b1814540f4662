//! Error types for the fundai crate

use thiserror::Error;

/// Result type for fundai operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fundai operations
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Crawling or rendering error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Structured extraction error
    #[error("Extraction error: {0}")]
    Extract(String),

    /// Completion provider error
    #[error("Model error: {0}")]
    Model(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),
}
