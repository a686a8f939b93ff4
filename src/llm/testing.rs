//! Scripted completion backend for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::error::CompletionError;

use super::{CompletionRequest, CompletionResponse, TextCompletion};

/// A completion backend that replays scripted responses in order and
/// records every request it receives.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: Mutex<Vec<CompletionRequest>>,
    available: bool,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            available: true,
        }
    }

    /// A backend that reports itself unavailable and fails every call.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Queue a successful response.
    pub fn push_text(&self, text: &str) {
        self.script.lock().push_back(Ok(text.to_string()));
    }

    /// Queue a failure.
    pub fn push_error(&self, err: CompletionError) {
        self.script.lock().push_back(Err(err));
    }

    /// Requests seen so far, in order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for ScriptedCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls.lock().push(request);

        if !self.available {
            return Err(CompletionError::Disabled);
        }

        match self.script.lock().pop_front() {
            Some(Ok(text)) => Ok(CompletionResponse {
                text,
                total_tokens: Some(0),
                duration_ms: 0,
            }),
            Some(Err(err)) => Err(err),
            None => Err(CompletionError::RequestFailed {
                reason: "No scripted response queued".to_string(),
            }),
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }
}
