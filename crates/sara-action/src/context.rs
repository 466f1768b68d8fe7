//! Session conversation history and variables.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;

use crate::types::{ContextEntry, Role};

#[derive(Default)]
struct ContextState {
    history: VecDeque<ContextEntry>,
    variables: HashMap<String, String>,
}

/// Bounded conversation history plus a free-form variable map.
///
/// History is a sliding window: once it exceeds `max_history` the oldest
/// entries are dropped and the retained tail keeps insertion order.
pub struct ContextStore {
    max_history: usize,
    state: Mutex<ContextState>,
}

impl ContextStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            state: Mutex::new(ContextState::default()),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    fn state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_user_message(&self, text: &str) {
        self.add_message(Role::User, text, BTreeMap::new());
    }

    pub fn add_assistant_message(&self, text: &str) {
        self.add_message(Role::Assistant, text, BTreeMap::new());
    }

    /// Append an entry, trimming the oldest ones past the limit.
    pub fn add_message(&self, role: Role, text: &str, metadata: BTreeMap<String, String>) {
        let mut state = self.state();
        state.history.push_back(ContextEntry {
            timestamp: Utc::now(),
            role,
            content: text.to_string(),
            metadata,
        });
        while state.history.len() > self.max_history {
            state.history.pop_front();
        }
        debug!(role = %role, history = state.history.len(), "Context entry added");
    }

    /// The most recent `count` entries, oldest first.
    pub fn get_recent(&self, count: usize) -> Vec<ContextEntry> {
        let state = self.state();
        let skip = state.history.len().saturating_sub(count);
        state.history.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().history.is_empty()
    }

    pub fn set_variable(&self, key: &str, value: impl Into<String>) {
        self.state().variables.insert(key.to_string(), value.into());
    }

    /// Value of `key`, or `default` when unset.
    pub fn get_variable(&self, key: &str, default: &str) -> String {
        self.state()
            .variables
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Drop all history and variables.
    pub fn clear(&self) {
        let mut state = self.state();
        state.history.clear();
        state.variables.clear();
        debug!("Context cleared");
    }
}
