//! Diff extractor trait definition

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One extractor-produced description of a transition. The corpus writer
/// only ever serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffRecord(serde_json::Value);

impl DiffRecord {
    /// Build a record from any serializable value.
    pub fn new<T: Serialize>(value: &T) -> Result<Self, ParseError> {
        serde_json::to_value(value)
            .map(DiffRecord)
            .map_err(|e| ParseError::new(format!("cannot encode diff record: {e}")))
    }

    pub fn from_value(value: serde_json::Value) -> Self {
        DiffRecord(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// The state labels of a transition did not match what the extractor
/// expects for its action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Protocol-specific interpreter of state labels, selected once per run.
pub trait DiffExtractor {
    /// Describe the transition `prev_state --action--> cur_state`.
    fn extract(
        &self,
        action: &str,
        prev_state: &str,
        cur_state: &str,
    ) -> Result<Vec<DiffRecord>, ParseError>;
}

impl<E: DiffExtractor + ?Sized> DiffExtractor for Box<E> {
    fn extract(
        &self,
        action: &str,
        prev_state: &str,
        cur_state: &str,
    ) -> Result<Vec<DiffRecord>, ParseError> {
        (**self).extract(action, prev_state, cur_state)
    }
}

impl<E: DiffExtractor + ?Sized> DiffExtractor for &E {
    fn extract(
        &self,
        action: &str,
        prev_state: &str,
        cur_state: &str,
    ) -> Result<Vec<DiffRecord>, ParseError> {
        (**self).extract(action, prev_state, cur_state)
    }
}
