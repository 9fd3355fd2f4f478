//! Concurrent execution of the tool calls attached to one assistant reply.
//!
//! Every call in a batch yields exactly one [`ToolResult`], in the order the
//! calls were received, whatever happens to it: unknown tool, bad arguments,
//! a failing or panicking tool body, or cancellation before it started.

use codepilot_core::agent::DEFAULT_MAX_CONCURRENCY;
use codepilot_core::error::{Result, ToolError};
use codepilot_core::logger::Logger;
use codepilot_core::message::{Message, MessageToolCall, ToolCallKind};
use codepilot_core::tool::{ToolRegistry, ToolResult};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs tool-call batches against a registry with a bounded worker count.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    /// Admission gate; one permit per concurrently running tool body.
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    logger: Arc<dyn Logger>,
}

enum Pending {
    Spawned {
        call_id: String,
        name: String,
        handle: JoinHandle<ToolResult>,
    },
    Ready(ToolResult),
}

impl ToolExecutor {
    /// A `max_concurrency` of 0 falls back to the default worker limit.
    pub fn new(registry: Arc<ToolRegistry>, max_concurrency: usize, logger: Arc<dyn Logger>) -> Self {
        let max_concurrency = if max_concurrency == 0 {
            DEFAULT_MAX_CONCURRENCY
        } else {
            max_concurrency
        };
        Self {
            registry,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            logger,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute a batch and return one result per call, in call order.
    pub async fn run(&self, calls: &[MessageToolCall], cancel: &CancellationToken) -> Vec<ToolResult> {
        if calls.is_empty() {
            return Vec::new();
        }

        self.logger.debug(&format!(
            "Executing {} tool calls (max concurrency {})",
            calls.len(),
            self.max_concurrency
        ));

        let pending: Vec<Pending> = calls.iter().map(|call| self.dispatch(call, cancel)).collect();

        join_all(pending.into_iter().map(|p| async move {
            match p {
                Pending::Ready(result) => result,
                Pending::Spawned {
                    call_id,
                    name,
                    handle,
                } => handle.await.unwrap_or_else(|e| {
                    ToolResult::err(call_id, ToolError::failed(name, format!("task failed: {e}")))
                }),
            }
        }))
        .await
    }

    /// Execute a batch and render the results as tool messages.
    ///
    /// Per-call failures are embedded as `Error: ...` text; this never fails
    /// under current behavior.
    pub async fn execute_tool_calls(
        &self,
        calls: &[MessageToolCall],
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>> {
        let results = self.run(calls, cancel).await;
        Ok(results.into_iter().map(ToolResult::into_message).collect())
    }

    fn dispatch(&self, call: &MessageToolCall, cancel: &CancellationToken) -> Pending {
        match &call.kind {
            ToolCallKind::Function { name, arguments } => {
                self.logger.debug(&format!("Tool call detected: {name} with input: {arguments}"));
                let handle = tokio::spawn(run_function_call(
                    self.registry.clone(),
                    self.semaphore.clone(),
                    self.logger.clone(),
                    cancel.clone(),
                    call.id.clone(),
                    name.clone(),
                    arguments.clone(),
                ));
                Pending::Spawned {
                    call_id: call.id.clone(),
                    name: name.clone(),
                    handle,
                }
            }
            ToolCallKind::Custom { name, .. } => {
                self.logger.warn(&format!("Unsupported custom tool call: {name}"));
                Pending::Ready(ToolResult::err(
                    call.id.clone(),
                    ToolError::UnsupportedCallKind(format!("custom tool call: {name}")),
                ))
            }
            ToolCallKind::Unknown { kind, .. } => {
                self.logger.warn(&format!("Encountered unsupported tool call variant: {kind}"));
                Pending::Ready(ToolResult::err(
                    call.id.clone(),
                    ToolError::UnsupportedCallKind(format!("tool call type '{kind}'")),
                ))
            }
        }
    }
}

async fn run_function_call(
    registry: Arc<ToolRegistry>,
    semaphore: Arc<Semaphore>,
    logger: Arc<dyn Logger>,
    cancel: CancellationToken,
    call_id: String,
    name: String,
    arguments: String,
) -> ToolResult {
    let cancelled = |call_id: String| {
        ToolResult::err(call_id, ToolError::Cancelled("cancelled before start".into()))
    };

    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return cancelled(call_id),
        permit = semaphore.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return cancelled(call_id),
        },
    };
    if cancel.is_cancelled() {
        return cancelled(call_id);
    }

    let payload = if arguments.trim().is_empty() {
        Ok(serde_json::Value::Object(Default::default()))
    } else {
        serde_json::from_str(&arguments)
            .map_err(|e| ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}")))
    };

    let outcome = match payload {
        Ok(payload) => registry.execute(&name, payload, logger.as_ref()).await,
        Err(e) => Err(e),
    };

    match &outcome {
        Ok(output) => logger.debug(&format!(
            "Tool execution successful, result length: {} chars",
            output.len()
        )),
        Err(e) => logger.warn(&format!("Tool execution failed: {e}")),
    }

    ToolResult {
        call_id,
        outcome,
    }
}
