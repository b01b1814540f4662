//! Error types for schema extraction

use crate::error::Error as CrateError;
use crate::model::ProviderError;
use thiserror::Error;

/// Why a completion could not be read as a listing
#[derive(Debug, Clone, Error)]
pub enum ResponseError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("response is not valid JSON after repair: {0}")]
    Malformed(String),

    #[error("response JSON is not an object")]
    NotAnObject,

    #[error("response carries none of the listing attributes")]
    NoAttributes,
}

/// Error type for schema extraction
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Every attempt failed; `reason` is the last attempt's error
    #[error("extraction failed for {url} after {attempts} attempts: {reason}")]
    ExtractionFailed {
        url: String,
        attempts: u32,
        reason: Box<ExtractError>,
    },
}

impl From<ExtractError> for CrateError {
    fn from(err: ExtractError) -> Self {
        CrateError::Extract(err.to_string())
    }
}
