//! The orchestrator: turn-taking between the user, the model and the tools.

use codepilot_core::agent::{AgentConfig, TurnState};
use codepilot_core::error::{Error, Result};
use codepilot_core::logger::Logger;
use codepilot_core::message::{Message, MessageToolCall};
use codepilot_core::provider::{Provider, ProviderRequest};
use codepilot_core::tool::{ToolRegistry, ToolResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::executor::ToolExecutor;
use crate::io::{OutputSink, UserInput};
use crate::memory::Memory;
use crate::reasoning::ReasoningChain;

/// What one user turn cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Text of the reply that ended the turn
    pub reply: String,
    pub inference_calls: usize,
    pub tool_calls: usize,
}

/// Drives the conversation against an inference client.
///
/// Inference calls are strictly sequential; only the tool calls of a single
/// reply run in parallel, through the [`ToolExecutor`].
pub struct Agent {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    executor: ToolExecutor,
    memory: Arc<Memory>,
    config: AgentConfig,
    output: Arc<dyn OutputSink>,
    logger: Arc<dyn Logger>,
    state: TurnState,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
        output: Arc<dyn OutputSink>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let executor = ToolExecutor::new(registry.clone(), config.max_concurrency, logger.clone());
        let memory = Arc::new(Memory::new(config.memory_capacity));
        install_system_message(&memory, &config);

        Self {
            provider,
            registry,
            executor,
            memory,
            config,
            output,
            logger,
            state: TurnState::Idle,
        }
    }

    /// Use a caller-owned memory. The configured system message replaces its prefix.
    pub fn with_memory(mut self, memory: Arc<Memory>) -> Self {
        install_system_message(&memory, &self.config);
        self.memory = memory;
        self
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn memory(&self) -> &Arc<Memory> {
        &self.memory
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub(crate) fn output(&self) -> &Arc<dyn OutputSink> {
        &self.output
    }

    /// Run the session until input ends or `cancel` fires.
    ///
    /// Inference failures abort the session. A reasoning request that runs
    /// out of steps is logged and the session moves on to the next input.
    pub async fn run(&mut self, input: &mut dyn UserInput, cancel: &CancellationToken) -> Result<()> {
        self.logger.info("Starting chat session");
        self.memory.reset_history();

        loop {
            self.transition(TurnState::AwaitingUserInput);

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = input.next_message() => next,
            };
            let Some(text) = next else {
                self.logger.info("User input ended, breaking from chat loop");
                break;
            };

            if text.trim().is_empty() {
                self.logger.debug("Skipping empty message");
                continue;
            }

            let outcome = if self.config.reasoning_enabled {
                self.reason(&text, cancel).await.map(|_| ())
            } else {
                self.process_turn(&text, cancel).await.map(|_| ())
            };

            match outcome {
                Ok(()) => {}
                Err(Error::Cancelled) => {
                    self.logger.info("Chat session cancelled");
                    break;
                }
                Err(e @ Error::ReasoningExceededSteps { .. }) => {
                    self.logger.warn(&e.to_string());
                }
                Err(e) => {
                    self.logger.error(&format!("Error during inference: {e}"));
                    self.transition(TurnState::Idle);
                    return Err(e);
                }
            }
        }

        self.transition(TurnState::Idle);
        self.logger.info("Chat session ended");
        Ok(())
    }

    /// Handle one user message through to a reply without tool calls.
    ///
    /// Follow-up inference calls after tool execution are not capped here.
    pub async fn process_turn(&mut self, text: &str, cancel: &CancellationToken) -> Result<TurnReport> {
        self.logger.debug(&format!("User input received: {text:?}"));
        self.memory.append(Message::user(text));

        let mut report = TurnReport::default();
        loop {
            let reply = self.infer(cancel).await?;
            report.inference_calls += 1;
            self.memory.append(reply.clone());

            if !reply.content.is_empty() {
                self.output.assistant_message(&reply.content);
            }

            if !reply.has_tool_calls() {
                self.finish_turn();
                report.reply = reply.content;
                return Ok(report);
            }

            report.tool_calls += reply.tool_calls.len();
            let tool_messages = self.execute_tools(&reply.tool_calls, cancel).await?;
            self.memory.append_many(tool_messages);
            self.logger.debug("Sending tool results back to the model");
        }
    }

    /// Answer one message with the bounded reasoning driver.
    pub async fn reason(&mut self, text: &str, cancel: &CancellationToken) -> Result<String> {
        let mut chain = ReasoningChain::new(self.config.reasoning_max_steps, self.logger.clone());
        chain.execute(self, text, cancel).await
    }

    /// One inference call over the current context, with every tool advertised.
    pub(crate) async fn infer(&mut self, cancel: &CancellationToken) -> Result<Message> {
        self.transition(TurnState::Inferring);

        let request = ProviderRequest {
            model: self.config.model.clone(),
            messages: self.memory.context(),
            max_tokens: Some(self.config.max_tokens),
            tools: self.registry.definitions(),
        };
        self.logger.debug(&format!(
            "Sending {} messages to {}",
            request.messages.len(),
            self.provider.name()
        ));

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            response = self.provider.complete(request) => response,
        };

        match response {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    self.logger.debug(&format!(
                        "Inference complete: model={} tokens={}",
                        response.model, usage.total_tokens
                    ));
                }
                Ok(response.message)
            }
            Err(e) => {
                self.logger.error(&format!("API call failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// Announce, execute and report a batch of tool calls.
    pub(crate) async fn execute_tools(
        &mut self,
        calls: &[MessageToolCall],
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>> {
        self.transition(TurnState::ExecutingTools);
        self.logger
            .debug(&format!("Processing {} tool calls", calls.len()));

        for call in calls {
            self.output.tool_call(display_name(call), call.arguments());
        }

        let results = self.executor.run(calls, cancel).await;

        for (call, result) in calls.iter().zip(&results) {
            match &result.outcome {
                Ok(output) => self.output.tool_result(display_name(call), output),
                Err(e) => self.output.tool_error(display_name(call), &e.to_string()),
            }
        }

        Ok(results.into_iter().map(ToolResult::into_message).collect())
    }

    pub(crate) fn finish_turn(&mut self) {
        self.transition(TurnState::Responded);
    }

    fn transition(&mut self, next: TurnState) {
        if self.state != next {
            self.logger
                .debug(&format!("Turn state: {} -> {next}", self.state));
            self.state = next;
        }
    }
}

fn install_system_message(memory: &Memory, config: &AgentConfig) {
    if let Some(system) = config.system_message.as_deref().filter(|s| !s.is_empty()) {
        memory.set_system_messages(vec![Message::system(system)]);
    }
}

fn display_name(call: &MessageToolCall) -> &str {
    call.name().unwrap_or("unsupported")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{NullOutput, RecordingOutput, ScriptedInput};
    use crate::test_helpers::{SequentialMockProvider, make_text_response};
    use codepilot_core::error::ProviderError;
    use codepilot_core::logger::{Level, NoopLogger, RecordingLogger};
    use codepilot_core::message::Role;

    fn agent_with(provider: Arc<SequentialMockProvider>, config: AgentConfig) -> Agent {
        Agent::new(
            provider,
            Arc::new(ToolRegistry::new()),
            config,
            Arc::new(NullOutput),
            Arc::new(NoopLogger),
        )
    }

    #[tokio::test]
    async fn simple_text_response() {
        let provider = Arc::new(SequentialMockProvider::single_text("Hello! How can I help?"));
        let mut agent = agent_with(provider.clone(), AgentConfig::default());

        let report = agent
            .process_turn("Hello!", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.reply, "Hello! How can I help?");
        assert_eq!(report.inference_calls, 1);
        assert_eq!(report.tool_calls, 0);
        assert_eq!(agent.state(), TurnState::Responded);
        // User + Assistant
        assert_eq!(agent.memory().message_count(), 2);
    }

    #[tokio::test]
    async fn system_message_is_sent_first() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let config = AgentConfig {
            system_message: Some("You are terse.".into()),
            ..AgentConfig::default()
        };
        let mut agent = agent_with(provider.clone(), config);
        agent.process_turn("hi", &CancellationToken::new()).await.unwrap();

        let request = &provider.requests()[0];
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, "You are terse.");
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.max_tokens, Some(1024));
    }

    #[tokio::test]
    async fn with_memory_installs_system_prefix() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let config = AgentConfig {
            system_message: Some("sys".into()),
            ..AgentConfig::default()
        };
        let memory = Arc::new(Memory::new(4));
        let agent = agent_with(provider, config).with_memory(memory.clone());

        assert!(Arc::ptr_eq(agent.memory(), &memory));
        assert_eq!(memory.context()[0].content, "sys");
    }

    #[tokio::test]
    async fn run_skips_empty_input_and_ends_cleanly() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response("first"),
            make_text_response("second"),
        ]));
        let output = Arc::new(RecordingOutput::new());
        let mut agent = Agent::new(
            provider.clone(),
            Arc::new(ToolRegistry::new()),
            AgentConfig::default(),
            output.clone(),
            Arc::new(NoopLogger),
        );

        let mut input = ScriptedInput::new(["one", "", "   ", "two"]);
        agent.run(&mut input, &CancellationToken::new()).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(output.assistant_messages(), vec!["first", "second"]);
        assert_eq!(agent.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn inference_failure_aborts_run() {
        let provider = Arc::new(SequentialMockProvider::with_results(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let logger = Arc::new(RecordingLogger::new());
        let mut agent = Agent::new(
            provider,
            Arc::new(ToolRegistry::new()),
            AgentConfig::default(),
            Arc::new(NullOutput),
            logger.clone(),
        );

        let mut input = ScriptedInput::new(["hello", "never read"]);
        let err = agent
            .run(&mut input, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Provider(ProviderError::AuthenticationFailed(_))));
        assert_eq!(input.remaining(), 1);
        assert!(logger.contains(Level::Error, "bad key"));
    }

    #[tokio::test]
    async fn cancelled_session_stops_without_error() {
        let provider = Arc::new(SequentialMockProvider::single_text("unused"));
        let mut agent = agent_with(provider.clone(), AgentConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut input = ScriptedInput::new(["hello"]);
        agent.run(&mut input, &cancel).await.unwrap();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn reasoning_mode_answers_in_one_step() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "Final answer: the config loader reads TOML first and then applies environment overrides.",
        ));
        let config = AgentConfig {
            reasoning_enabled: true,
            ..AgentConfig::default()
        };
        let mut agent = agent_with(provider.clone(), config);

        let mut input = ScriptedInput::new(["how is config loaded?"]);
        agent.run(&mut input, &CancellationToken::new()).await.unwrap();
        assert_eq!(provider.call_count(), 1);
    }
}
