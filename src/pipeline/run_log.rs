//! The run log: the one channel through which a pipeline run reports status.

use serde::Serialize;

use crate::pipeline::FilterState;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preflight,
    Execute,
}

/// One `(index, code, message)` record. Negative codes are fatal, positive
/// codes are warnings, 0 marks a filter that executed cleanly.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FilterLogEntry {
    pub index: usize,
    pub filter: String,
    pub phase: Phase,
    pub code: i32,
    pub message: String,
}

impl FilterLogEntry {
    pub fn is_error(&self) -> bool {
        self.code < 0
    }

    pub fn is_warning(&self) -> bool {
        self.code > 0
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLog {
    entries: Vec<FilterLogEntry>,
    states: Vec<FilterState>,
}

impl RunLog {
    pub(crate) fn new(filter_count: usize) -> Self {
        Self {
            entries: Vec::new(),
            states: vec![FilterState::Constructed; filter_count],
        }
    }

    pub(crate) fn record(&mut self, index: usize, filter: &str, phase: Phase, code: i32, message: impl Into<String>) {
        self.entries.push(FilterLogEntry {
            index,
            filter: filter.to_string(),
            phase,
            code,
            message: message.into(),
        });
    }

    pub(crate) fn has_entry(&self, index: usize, phase: Phase, code: i32, message: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.index == index && e.phase == phase && e.code == code && e.message == message)
    }

    pub(crate) fn set_state(&mut self, index: usize, state: FilterState) {
        if let Some(slot) = self.states.get_mut(index) {
            *slot = state;
        }
    }

    pub fn entries(&self) -> &[FilterLogEntry] {
        &self.entries
    }

    /// Final state of every filter, in pipeline order.
    pub fn states(&self) -> &[FilterState] {
        &self.states
    }

    pub fn is_success(&self) -> bool {
        !self.entries.iter().any(FilterLogEntry::is_error)
    }

    pub fn first_error(&self) -> Option<&FilterLogEntry> {
        self.entries.iter().find(|e| e.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &FilterLogEntry> {
        self.entries.iter().filter(|e| e.is_warning())
    }

    /// Number of filters that executed.
    pub fn executed_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == FilterState::Executed)
            .count()
    }
}
