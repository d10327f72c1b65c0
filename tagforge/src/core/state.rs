//! Per-transform mutable state that survives across steps.
//!
//! One [`IterationState`] exists per transform name. It is created lazily the
//! first time the transform is driven and lives as long as the engine. The
//! handle is passed explicitly into every step-function call.

use std::collections::BTreeMap;

use serde_json::Value;

/// Position of a strategy within its element sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Cursor {
    /// Not activated yet; advancing reports exhaustion.
    #[default]
    Idle,
    Counted {
        emitted: usize,
        limit: usize,
    },
    Range {
        next: i64,
        end: i64,
        step: i64,
    },
    List {
        elements: Vec<String>,
        index: usize,
    },
}

impl Cursor {
    /// Element presented to the step function on the init call.
    pub(crate) fn initial_element(&self, literal: &str) -> String {
        match self {
            Cursor::Range { next, .. } => next.to_string(),
            _ => literal.to_string(),
        }
    }

    /// Move to the next element, or `None` when the sequence is spent.
    pub(crate) fn next_element(&mut self, literal: &str) -> Option<String> {
        match self {
            Cursor::Idle => None,
            Cursor::Counted { emitted, limit } => {
                if *emitted >= *limit {
                    return None;
                }
                *emitted += 1;
                Some(literal.to_string())
            }
            Cursor::Range { next, end, step } => {
                let in_bounds = if *step > 0 { *next < *end } else { *next > *end };
                if !in_bounds {
                    return None;
                }
                let current = *next;
                *next = next.saturating_add(*step);
                Some(current.to_string())
            }
            Cursor::List { elements, index } => {
                let element = elements.get(*index)?.clone();
                *index += 1;
                Some(element)
            }
        }
    }
}

/// State handle handed to iterative step functions.
#[derive(Debug, Clone, Default)]
pub struct IterationState {
    /// True exactly on the call that (re)initializes the transform.
    pub init: bool,
    iteration: usize,
    inner: String,
    label: Option<String>,
    pub(crate) cursor: Cursor,
    vars: BTreeMap<String, Value>,
}

impl IterationState {
    /// Number of values produced since the last init call.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Literal inner text of the region currently being driven.
    pub fn inner(&self) -> &str {
        &self.inner
    }

    /// Materialized element list for list-based strategies; empty otherwise.
    pub fn elements(&self) -> &[String] {
        match &self.cursor {
            Cursor::List { elements, .. } => elements,
            _ => &[],
        }
    }

    /// Attach a label to the payload produced by the current step.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.vars.get_mut(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub(crate) fn begin(&mut self, literal: &str, cursor: Cursor) {
        self.init = true;
        self.iteration = 0;
        self.inner = literal.to_string();
        self.cursor = cursor;
    }

    pub(crate) fn resume(&mut self, literal: &str) {
        self.init = false;
        self.inner = literal.to_string();
    }

    pub(crate) fn record_value(&mut self) {
        self.iteration += 1;
    }

    pub(crate) fn take_label(&mut self) -> Option<String> {
        self.label.take()
    }
}

/// Lazily populated map of transform name to state.
#[derive(Debug, Default)]
pub struct StateStore {
    states: BTreeMap<String, IterationState>,
}

impl StateStore {
    pub fn entry(&mut self, transform: &str) -> &mut IterationState {
        self.states.entry(transform.to_string()).or_default()
    }

    pub fn get(&self, transform: &str) -> Option<&IterationState> {
        self.states.get(transform)
    }

    /// Drain labels set during the last step; the last transform (by name) wins.
    pub fn take_label(&mut self) -> Option<String> {
        let mut label = None;
        for state in self.states.values_mut() {
            if let Some(found) = state.take_label() {
                label = Some(found);
            }
        }
        label
    }
}
