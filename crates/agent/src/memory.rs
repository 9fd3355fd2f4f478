//! Bounded conversation memory.
//!
//! A fixed system prefix followed by a rolling history window. The window is
//! counted in whole messages; when an append overflows it, the oldest
//! history entries are dropped. The system prefix is never trimmed.

use codepilot_core::message::Message;
use codepilot_core::agent::DEFAULT_MEMORY_CAPACITY;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MemoryState {
    system: Vec<Message>,
    history: Vec<Message>,
}

/// Thread-safe conversation buffer shared by the orchestrator and its drivers.
#[derive(Debug)]
pub struct Memory {
    state: RwLock<MemoryState>,
    /// Maximum history length; 0 disables the bound.
    max_history: usize,
}

impl Memory {
    pub fn new(max_history: usize) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            max_history,
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Replace the system prefix wholesale. An empty vector clears it.
    pub fn set_system_messages(&self, messages: Vec<Message>) {
        self.write().system = messages;
    }

    pub fn append(&self, message: Message) {
        let mut state = self.write();
        state.history.push(message);
        self.trim(&mut state);
    }

    /// Append a batch under a single lock, so readers never see half of it.
    pub fn append_many(&self, messages: impl IntoIterator<Item = Message>) {
        let mut state = self.write();
        state.history.extend(messages);
        self.trim(&mut state);
    }

    /// Clear the history. The system prefix is kept as is.
    pub fn reset_history(&self) {
        self.write().history.clear();
    }

    /// Snapshot of system ++ history.
    pub fn context(&self) -> Vec<Message> {
        let state = self.read();
        state
            .system
            .iter()
            .chain(state.history.iter())
            .cloned()
            .collect()
    }

    /// Snapshot of the history alone.
    pub fn history(&self) -> Vec<Message> {
        self.read().history.clone()
    }

    /// Total entries across the prefix and the history.
    pub fn message_count(&self) -> usize {
        let state = self.read();
        state.system.len() + state.history.len()
    }

    fn trim(&self, state: &mut MemoryState) {
        if self.max_history == 0 {
            return;
        }
        let overflow = state.history.len().saturating_sub(self.max_history);
        if overflow > 0 {
            state.history.drain(..overflow);
        }
    }

    // A panicking writer cannot leave the state half-mutated: every mutation
    // completes its Vec operation before the guard drops.
    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}
