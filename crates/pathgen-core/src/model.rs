//! Core data structures for the state graph

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a model-checker state, exactly as written in the graph file.
/// Negative ids denote auxiliary states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct StateId(pub i64);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for StateId {
    fn from(value: i64) -> Self {
        StateId(value)
    }
}

/// Arena index of a transition inside a [`crate::StateGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EdgeId(pub usize);

/// A single state in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateNode {
    pub id: StateId,
    /// Opaque state payload. `None` while the node is only known as the
    /// destination of an edge whose label declaration has not been read yet.
    pub label: Option<String>,
}

impl StateNode {
    pub fn new(id: StateId, label: Option<String>) -> Self {
        StateNode { id, label }
    }

    pub fn is_labelled(&self) -> bool {
        self.label.is_some()
    }
}

/// A labeled transition between two states.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub src: StateId,
    pub dst: StateId,
    /// Name of the action that caused the transition.
    pub action: String,
}

impl Transition {
    pub fn new(src: StateId, dst: StateId, action: impl Into<String>) -> Self {
        Transition {
            src,
            dst,
            action: action.into(),
        }
    }
}
