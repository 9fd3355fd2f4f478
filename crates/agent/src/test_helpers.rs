//! Scripted inference clients for exercising the loop without a network.

use codepilot_core::error::ProviderError;
use codepilot_core::message::{Message, MessageToolCall};
use codepilot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

enum Script {
    Queue(VecDeque<Result<ProviderResponse, ProviderError>>),
    Repeat(ProviderResponse),
}

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue; once the
/// queue is empty further calls fail with `InvalidResponse`. Every request is
/// recorded for later inspection.
pub struct SequentialMockProvider {
    script: Mutex<Script>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Script that may include failures.
    pub fn with_results(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(Script::Queue(results.into())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Return the same response forever.
    pub fn repeating(response: ProviderResponse) -> Self {
        Self {
            script: Mutex::new(Script::Repeat(response)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// Create a provider that first returns tool calls, then a final answer.
    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, thought: &str, answer: &str) -> Self {
        Self::new(vec![
            make_tool_call_response(tool_calls, thought),
            make_text_response(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let mut script = self
            .script
            .lock()
            .map_err(|_| ProviderError::InvalidResponse("mock script poisoned".into()))?;
        match &mut *script {
            Script::Repeat(response) => Ok(response.clone()),
            Script::Queue(queue) => queue.pop_front().unwrap_or_else(|| {
                Err(ProviderError::InvalidResponse(
                    "no more scripted responses".into(),
                ))
            }),
        }
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create an assistant response carrying tool calls and optional text.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text).with_tool_calls(tool_calls),
        usage: Some(Usage {
            prompt_tokens: 20,
            completion_tokens: 10,
            total_tokens: 30,
        }),
        model: "mock-model".into(),
    }
}
