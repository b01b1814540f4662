use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info_span, warn, Instrument};

use super::error::{ExtractError, ResponseError};
use super::listing::StructuredListing;
use super::prompt::default_instruction;
use super::response::parse_response;
use crate::model::CompletionProvider;
use crate::retry::{retry, RetryPolicy};

/// Configuration for the schema extractor
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// System instruction sent with every request
    pub instruction: String,

    /// Resubmission policy for failed or unreadable completions
    pub retry: RetryPolicy,

    /// Listings extracted concurrently by the pipeline
    pub concurrency: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            instruction: default_instruction(),
            retry: RetryPolicy {
                max_attempts: 10,
                base_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(30),
            },
            concurrency: 4,
        }
    }
}

impl ExtractorConfig {
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::new()
    }
}

/// Builder for ExtractorConfig
#[derive(Debug, Default)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::default(),
        }
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.instruction = instruction.into();
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the maximum number of attempts, keeping the backoff
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = max_attempts;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}

/// A successfully extracted listing
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedListing {
    pub url: String,

    /// The parsed model response, as stored in `raw_property_listings`
    pub raw: Map<String, Value>,

    /// The coerced attributes, as stored in `property_listings`
    pub listing: StructuredListing,
}

/// Asks a completion provider for a listing's attributes until it gives a
/// readable answer
pub struct SchemaExtractor<P> {
    provider: P,
    config: ExtractorConfig,
}

impl<P: CompletionProvider> SchemaExtractor<P> {
    pub fn new(provider: P, config: ExtractorConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Extract the structured record for one sliced listing page.
    ///
    /// Provider errors and unreadable responses both lead to a fresh request,
    /// up to the configured number of attempts.
    pub async fn extract_structured(
        &self,
        sliced: &str,
        url: &str,
    ) -> Result<ExtractedListing, ExtractError> {
        let result = retry(&self.config.retry, move |attempt| async move {
            debug!("Extraction attempt {} for {}", attempt, url);
            self.attempt(sliced, url).await
        })
        .instrument(info_span!("extract", url))
        .await;

        result.map_err(|exhausted| {
            warn!(
                "Giving up on {} after {} attempts: {}",
                url, exhausted.attempts, exhausted.last_error
            );
            ExtractError::ExtractionFailed {
                url: url.to_string(),
                attempts: exhausted.attempts,
                reason: Box::new(exhausted.last_error),
            }
        })
    }

    async fn attempt(&self, sliced: &str, url: &str) -> Result<ExtractedListing, ExtractError> {
        let response = self.provider.complete(&self.config.instruction, sliced).await?;
        let raw = parse_response(&response)?;
        let listing = StructuredListing::from_raw(&raw)
            .map_err(|e| ResponseError::Malformed(e.to_string()))?;

        if listing.populated() == 0 {
            return Err(ResponseError::NoAttributes.into());
        }

        Ok(ExtractedListing {
            url: url.to_string(),
            raw,
            listing,
        })
    }
}
