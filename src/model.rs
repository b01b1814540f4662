//! # LLM Client Module
//!
//! This module provides the completion capability used by the schema
//! extractor, with built-in rate limiting to prevent API quota exhaustion.
//!
//! ## Key Components
//!
//! - `CompletionProvider`: "given an instruction and a text, return a completion"
//! - `Client`: wraps a rig completion model configured for Gemini
//! - `RateLimitedCompletionModel`: adds a `governor` quota to any rig model
//!
//! ## Features
//!
//! - Quota configured per process (`FUNDAI_COMPLETIONS_PER_MINUTE`)
//! - Instrumentation with tracing spans for monitoring
//! - Type-safe model integration with the `rig` framework

use std::future::Future;

use governor::{Quota, RateLimiter};
use ratelimited_completion::RateLimitedCompletionModel;
use rig::{completion::CompletionModel, providers::gemini};

use crate::config::{ConfigError, ModelConfig};

pub mod error;
pub mod ratelimited_completion;

#[cfg(test)]
pub mod mock_model;

pub use error::ProviderError;

/// Produces a completion for a text under a fixed instruction
pub trait CompletionProvider: Send + Sync {
    /// `instruction` is the system preamble, `text` the user content
    fn complete(
        &self,
        instruction: &str,
        text: &str,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

#[derive(Debug, Clone)]
pub struct Client<C>
where
    C: CompletionModel,
{
    completion_model: C,
}

impl Client<RateLimitedCompletionModel<gemini::completion::CompletionModel>> {
    /// Build a Gemini client from process configuration
    pub fn new_gemini_from_config(config: &ModelConfig) -> Result<Self, ConfigError> {
        let gemini_client = gemini::Client::new(config.api_key()?);
        Ok(Self::new_gemini(gemini_client, config))
    }

    pub fn new_gemini(gemini_client: gemini::Client, config: &ModelConfig) -> Self {
        let completion_limiter =
            RateLimiter::direct(Quota::per_minute(config.completions_per_minute));
        let completion_model = RateLimitedCompletionModel::new(
            gemini_client.completion_model(&config.model),
            completion_limiter,
        );
        Self { completion_model }
    }
}

impl<C> Client<C>
where
    C: CompletionModel,
{
    pub fn completion(&self) -> &C {
        &self.completion_model
    }
}
