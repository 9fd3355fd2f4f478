//! Step cap and termination of the reasoning driver.

use codepilot_agent::test_helpers::{
    SequentialMockProvider, make_text_response, make_tool_call_response,
};
use codepilot_agent::{Agent, NullOutput, ReasoningChain, StepType};
use codepilot_core::agent::AgentConfig;
use codepilot_core::error::Error;
use codepilot_core::logger::NoopLogger;
use codepilot_core::message::{MessageToolCall, Role};
use codepilot_core::tool::ToolRegistry;
use codepilot_tools::register_builtin_tools;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn agent(provider: Arc<SequentialMockProvider>, max_steps: u32) -> Agent {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, &NoopLogger).unwrap();
    let config = AgentConfig {
        reasoning_enabled: true,
        reasoning_max_steps: max_steps,
        ..AgentConfig::default()
    };
    Agent::new(
        provider,
        Arc::new(registry),
        config,
        Arc::new(NullOutput),
        Arc::new(NoopLogger),
    )
}

#[tokio::test]
async fn endless_tool_calls_hit_the_step_cap() {
    let provider = Arc::new(SequentialMockProvider::repeating(make_tool_call_response(
        vec![MessageToolCall::function("call_1", "no_such_tool", "{}")],
        "Let me look around.",
    )));
    let mut agent = agent(provider.clone(), 3);

    let err = agent
        .reason("find the bug", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ReasoningExceededSteps { max_steps: 3 }));
    assert_eq!(err.to_string(), "reasoning chain exceeded maximum steps (3)");
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn tool_results_feed_the_next_step() {
    let provider = Arc::new(SequentialMockProvider::new(vec![
        make_tool_call_response(
            vec![MessageToolCall::function("call_1", "no_such_tool", "{}")],
            "",
        ),
        make_text_response("Final answer: the tool is not available in this workspace."),
    ]));
    let mut agent = agent(provider.clone(), 5);
    let mut chain = ReasoningChain::new(5, Arc::new(NoopLogger));

    let answer = chain
        .execute(&mut agent, "use the tool", &CancellationToken::new())
        .await
        .unwrap();

    assert!(answer.starts_with("Final answer:"));
    assert_eq!(provider.call_count(), 2);

    let second = &provider.requests()[1].messages;
    assert!(second.iter().any(|m| m.role == Role::Tool && m.content.contains("not found")));

    let steps = chain.steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].step_type, StepType::Action);
    assert!(steps[0].result.contains("not found"));
    assert_eq!(steps[1].step_type, StepType::Final);

    chain.reset();
    assert!(chain.steps().is_empty());
}

#[tokio::test]
async fn short_tentative_replies_keep_the_chain_going() {
    let provider = Arc::new(SequentialMockProvider::new(vec![
        make_text_response("Hmm."),
        make_text_response(
            "The parser rejects trailing commas because the grammar forbids them.",
        ),
    ]));
    let mut agent = agent(provider.clone(), 4);

    let answer = agent
        .reason("why does parsing fail?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 2);
    assert!(answer.starts_with("The parser"));
}

#[tokio::test]
async fn each_request_starts_from_fresh_history() {
    let provider = Arc::new(SequentialMockProvider::new(vec![
        make_text_response("Answer: one"),
        make_text_response("Answer: two"),
    ]));
    let mut agent = agent(provider.clone(), 2);
    let cancel = CancellationToken::new();

    agent.reason("first", &cancel).await.unwrap();
    agent.reason("second", &cancel).await.unwrap();

    let second = &provider.requests()[1].messages;
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].content, "second");
}
