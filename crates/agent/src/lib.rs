//! The conversation loop — the heart of Codepilot.
//!
//! The agent alternates between the model and the local tools:
//!
//! 1. **Receive** a user message from the input source
//! 2. **Send** the bounded conversation context to the model, with every
//!    registered tool advertised
//! 3. **If tool calls**: run them concurrently, append one tool message per
//!    call, and go back to step 2
//! 4. **If text only**: the turn is over; wait for the next user message
//!
//! [`ReasoningChain`] is an alternate driver that caps the number of model
//! calls spent on a single request.

pub mod executor;
pub mod io;
pub mod loop_runner;
pub mod memory;
pub mod reasoning;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use executor::ToolExecutor;
pub use io::{NullOutput, OutputSink, UserInput};
#[cfg(any(test, feature = "test-helpers"))]
pub use io::{OutputEvent, RecordingOutput, ScriptedInput};
pub use loop_runner::{Agent, TurnReport};
pub use memory::Memory;
pub use reasoning::{ReasoningChain, ReasoningPolicy, ReasoningStep, StepType};
