//! Error types for the completion provider

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for completion requests
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider rejected or failed the request
    #[error("completion failed: {0}")]
    Completion(String),

    /// The provider answered with no text
    #[error("empty completion")]
    Empty,
}

impl From<ProviderError> for CrateError {
    fn from(err: ProviderError) -> Self {
        CrateError::Model(err.to_string())
    }
}
