//! Collaborators at the edge of the loop: where user text comes from and
//! where the conversation is shown.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-helpers"))]
use std::collections::VecDeque;
#[cfg(any(test, feature = "test-helpers"))]
use std::sync::Mutex;

/// Source of user messages.
#[async_trait]
pub trait UserInput: Send {
    /// The next message, or `None` once input has ended.
    async fn next_message(&mut self) -> Option<String>;
}

/// Presentation-only sink. Nothing written here feeds back into the loop.
pub trait OutputSink: Send + Sync {
    fn assistant_message(&self, text: &str);

    fn tool_call(&self, name: &str, arguments: &str);

    fn tool_result(&self, name: &str, output: &str);

    fn tool_error(&self, name: &str, error: &str);
}

#[cfg(any(test, feature = "test-helpers"))]
/// Input backed by a fixed list of lines.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
#[async_trait]
impl UserInput for ScriptedInput {
    async fn next_message(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl OutputSink for NullOutput {
    fn assistant_message(&self, _text: &str) {}
    fn tool_call(&self, _name: &str, _arguments: &str) {}
    fn tool_result(&self, _name: &str, _output: &str) {}
    fn tool_error(&self, _name: &str, _error: &str) {}
}

#[cfg(any(test, feature = "test-helpers"))]
/// One thing shown to the user, as captured by [`RecordingOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Assistant(String),
    ToolCall { name: String, arguments: String },
    ToolResult { name: String, output: String },
    ToolError { name: String, error: String },
}

#[cfg(any(test, feature = "test-helpers"))]
/// Captures every output event, in order.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    events: Mutex<Vec<OutputEvent>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Assistant texts only.
    pub fn assistant_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutputEvent::Assistant(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: OutputEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl OutputSink for RecordingOutput {
    fn assistant_message(&self, text: &str) {
        self.push(OutputEvent::Assistant(text.to_string()));
    }

    fn tool_call(&self, name: &str, arguments: &str) {
        self.push(OutputEvent::ToolCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        });
    }

    fn tool_result(&self, name: &str, output: &str) {
        self.push(OutputEvent::ToolResult {
            name: name.to_string(),
            output: output.to_string(),
        });
    }

    fn tool_error(&self, name: &str, error: &str) {
        self.push(OutputEvent::ToolError {
            name: name.to_string(),
            error: error.to_string(),
        });
    }
}
