//! # Mock Models for Testing
//!
//! - `MockCompletionModel` implements `CompletionProvider`. It answers from a
//!   closure, a fixed text, or a scripted sequence, and records how it was
//!   called.
//! - `MockRigModel` implements rig's `CompletionModel`, so the rate-limited
//!   wrapper can be exercised without a network call.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rig::completion::message::UserContent;
use rig::completion::{
    AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    Message,
};
use rig::one_or_many::OneOrMany;

use super::{CompletionProvider, ProviderError};

type Responder = dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync;

/// A mock completion provider for testing purposes.
#[derive(Clone)]
pub struct MockCompletionModel {
    responder: Arc<Responder>,
    calls: Arc<AtomicUsize>,
    instructions: Arc<Mutex<Vec<String>>>,
}

impl MockCompletionModel {
    /// Answers every prompt text through `responder`
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(AtomicUsize::new(0)),
            instructions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answers with the same text
    pub fn always(response: &str) -> Self {
        let response = response.to_string();
        Self::from_fn(move |_| Ok(response.clone()))
    }

    /// Answers with each response in turn, repeating the last one
    pub fn sequence(responses: &[&str]) -> Self {
        let queue: VecDeque<String> = responses.iter().map(|r| r.to_string()).collect();
        let queue = Mutex::new(queue);
        Self::from_fn(move |_| {
            let mut queue = queue.lock().unwrap();
            let next = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            next.ok_or(ProviderError::Empty)
        })
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Instructions received, in call order
    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }
}

impl CompletionProvider for MockCompletionModel {
    async fn complete(&self, instruction: &str, text: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        (self.responder)(text)
    }
}

/// What a `MockRigModel` saw of one request
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub preamble: Option<String>,
    pub prompt: String,
    pub temperature: Option<f64>,
}

/// A rig completion model that answers every request with the same text.
#[derive(Debug, Clone)]
pub struct MockRigModel {
    response: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockRigModel {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received, in call order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CompletionModel for MockRigModel {
    type Response = String;

    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        let prompt = match &request.prompt {
            Message::User { content } => match content.first() {
                UserContent::Text(text) => text.text,
                _ => String::new(),
            },
            _ => String::new(),
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            preamble: request.preamble.clone(),
            prompt,
            temperature: request.temperature,
        });

        Ok(CompletionResponse {
            choice: OneOrMany::one(AssistantContent::text(&self.response)),
            raw_response: self.response.clone(),
        })
    }
}
