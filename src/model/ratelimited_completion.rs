use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use rig::{
    agent::AgentBuilder,
    completion::{self, CompletionError, CompletionModel, CompletionRequest, CompletionResponse, Prompt},
};
use tracing::{debug_span, info_span, Instrument};

use super::{CompletionProvider, ProviderError};

pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedCompletionModel<M>
where
    M: CompletionModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }

    pub fn agent(self) -> AgentBuilder<Self> {
        AgentBuilder::new(self)
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = RateLimitResponse<M::Response>;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<completion::CompletionResponse<Self::Response>, CompletionError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        let response = self
            .model
            .completion(completion_request)
            .instrument(info_span!("completion"))
            .await;
        response.map(|response| CompletionResponse {
            choice: response.choice,
            raw_response: RateLimitResponse {
                response: response.raw_response,
            },
        })
    }
}

impl<M: CompletionModel> CompletionProvider for RateLimitedCompletionModel<M> {
    async fn complete(&self, instruction: &str, text: &str) -> Result<String, ProviderError> {
        // Non-zero so a resubmitted request can yield a different answer.
        let agent = self
            .clone()
            .agent()
            .preamble(instruction)
            .temperature(0.2)
            .build();

        let completion = agent
            .prompt(text)
            .await
            .map_err(|e| ProviderError::Completion(e.to_string()))?;

        if completion.trim().is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use governor::{Quota, RateLimiter};

    use super::*;
    use crate::model::mock_model::MockRigModel;

    fn limited(model: MockRigModel, per_minute: u32) -> RateLimitedCompletionModel<MockRigModel> {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap());
        RateLimitedCompletionModel::new(model, RateLimiter::direct(quota))
    }

    #[tokio::test]
    async fn test_complete_sends_instruction_as_preamble() {
        let rig_model = MockRigModel::new("{\"city\": \"Rotterdam\"}");
        let model = limited(rig_model.clone(), 60);

        let completion = model
            .complete("Extract the listing.", "Nobelstraat 37 C")
            .await
            .unwrap();

        assert_eq!(completion, "{\"city\": \"Rotterdam\"}");
        let requests = rig_model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].preamble.as_deref(), Some("Extract the listing."));
        assert_eq!(requests[0].prompt, "Nobelstraat 37 C");
        assert_eq!(requests[0].temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_blank_completion_is_an_error() {
        let model = limited(MockRigModel::new("  \n"), 60);

        let result = model.complete("Extract the listing.", "page").await;

        assert!(matches!(result, Err(ProviderError::Empty)));
    }

    #[tokio::test]
    async fn test_completion_waits_for_the_limiter() {
        let model = limited(MockRigModel::new("{}"), 1);

        model.complete("Extract the listing.", "page").await.unwrap();

        // The single cell of a one-per-minute quota is spent.
        assert!(model.limiter.check().is_err());
    }
}
