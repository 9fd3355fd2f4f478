//! Bounded multi-step reasoning driver.
//!
//! Instead of one loop per user message, the chain spends up to `max_steps`
//! inference calls on a single request and stops as soon as a reply looks
//! like an answer. Recognizing an answer is a lexical heuristic; the
//! thresholds live in [`ReasoningPolicy`] so callers can tune them.

use codepilot_core::agent::DEFAULT_REASONING_MAX_STEPS;
use codepilot_core::error::{Error, Result};
use codepilot_core::logger::Logger;
use codepilot_core::message::{Message, MessageToolCall};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::loop_runner::Agent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Thought,
    Action,
    Observation,
    Final,
}

/// One inference call of a chain.
#[derive(Debug, Clone)]
pub struct ReasoningStep {
    pub step_type: StepType,
    pub content: String,
    pub tool_calls: Vec<MessageToolCall>,
    /// Tool message texts produced for this step, newline-joined
    pub result: String,
}

/// Lexical cues used to classify replies and detect completion.
///
/// Markers are matched case-insensitively as substrings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningPolicy {
    /// Minimum trimmed length for an unmarked reply to count as complete
    pub min_complete_len: usize,
    pub final_markers: Vec<String>,
    pub thought_markers: Vec<String>,
    /// Words suggesting the model intends to keep working
    pub action_markers: Vec<String>,
}

impl Default for ReasoningPolicy {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            min_complete_len: 50,
            final_markers: owned(&["final answer", "answer:", "conclusion:"]),
            thought_markers: owned(&["thinking", "thought:", "reason:"]),
            action_markers: owned(&[
                "let me", "i'll", "i will", "next", "now", "then", "search", "read", "execute",
                "run", "check", "verify",
            ]),
        }
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

impl ReasoningPolicy {
    pub fn classify(&self, message: &Message) -> StepType {
        if message.has_tool_calls() {
            return StepType::Action;
        }
        let content = message.content.to_lowercase();
        if contains_any(&content, &self.final_markers) {
            StepType::Final
        } else if contains_any(&content, &self.thought_markers) {
            StepType::Thought
        } else {
            StepType::Observation
        }
    }

    /// Explicit answer marker present.
    pub fn is_final_answer(&self, content: &str) -> bool {
        contains_any(&content.to_lowercase(), &self.final_markers)
    }

    /// No hint of further work, and long enough to be more than a filler reply.
    pub fn is_complete_answer(&self, content: &str) -> bool {
        let lower = content.to_lowercase();
        !contains_any(&lower, &self.action_markers)
            && content.trim().chars().count() > self.min_complete_len
    }
}

pub struct ReasoningChain {
    steps: Vec<ReasoningStep>,
    max_steps: u32,
    policy: ReasoningPolicy,
    logger: Arc<dyn Logger>,
}

impl ReasoningChain {
    /// A `max_steps` of 0 falls back to the default step cap.
    pub fn new(max_steps: u32, logger: Arc<dyn Logger>) -> Self {
        Self {
            steps: Vec::new(),
            max_steps: if max_steps == 0 {
                DEFAULT_REASONING_MAX_STEPS
            } else {
                max_steps
            },
            policy: ReasoningPolicy::default(),
            logger,
        }
    }

    pub fn with_policy(mut self, policy: ReasoningPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn policy(&self) -> &ReasoningPolicy {
        &self.policy
    }

    /// Steps recorded since the last [`reset`](Self::reset).
    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    pub fn reset(&mut self) {
        self.steps.clear();
    }

    /// Drive `agent` until a reply qualifies as the answer or the cap is hit.
    ///
    /// The agent's history is cleared first; its system prefix is kept.
    pub async fn execute(
        &mut self,
        agent: &mut Agent,
        user_input: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.logger
            .info(&format!("Starting reasoning chain for user input: {user_input:?}"));

        agent.memory().reset_history();
        agent.memory().append(Message::user(user_input));

        for step in 1..=self.max_steps {
            self.logger.debug(&format!("Reasoning step {step}"));

            let reply = agent.infer(cancel).await?;
            let step_type = self.policy.classify(&reply);
            agent.memory().append(reply.clone());

            if !reply.content.is_empty() {
                agent.output().assistant_message(&reply.content);
            }

            let mut record = ReasoningStep {
                step_type,
                content: reply.content.clone(),
                tool_calls: reply.tool_calls.clone(),
                result: String::new(),
            };

            if reply.has_tool_calls() {
                let tool_messages = agent.execute_tools(&reply.tool_calls, cancel).await?;
                record.result = tool_messages
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                agent.memory().append_many(tool_messages);
                self.steps.push(record);
                continue;
            }

            self.steps.push(record);

            if self.policy.is_final_answer(&reply.content) {
                self.logger.info(&format!(
                    "Reasoning chain completed with final answer after {step} steps"
                ));
                agent.finish_turn();
                return Ok(reply.content);
            }

            if step_type == StepType::Final || self.policy.is_complete_answer(&reply.content) {
                self.logger
                    .info(&format!("Reasoning chain completed after {step} steps"));
                agent.finish_turn();
                return Ok(reply.content);
            }
        }

        self.logger.warn(&format!(
            "Reasoning chain reached maximum steps ({}) without completion",
            self.max_steps
        ));
        Err(Error::ReasoningExceededSteps {
            max_steps: self.max_steps,
        })
    }
}
