//! Diff extractors for the protocols we generate traces for

pub mod action;
pub mod raft;
pub mod zookeeper;

use pathgen_core::{DiffExtractor, DiffRecord, ParseError};
use serde::Serialize;

/// The record every extractor emits for one transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionDiff<M> {
    pub action: String,
    pub diff: Vec<M>,
}

impl<M: Serialize> TransitionDiff<M> {
    pub fn new(action: &str, diff: Vec<M>) -> Self {
        TransitionDiff {
            action: action.to_string(),
            diff,
        }
    }

    /// Wrap as the single record of a transition.
    pub fn into_records(self) -> Result<Vec<DiffRecord>, ParseError> {
        Ok(vec![DiffRecord::new(&self)?])
    }
}

/// Names accepted by [`get_extractor`].
pub fn available() -> &'static [&'static str] {
    &["action", "raft", "zookeeper"]
}

/// Get the extractor for a protocol name.
pub fn get_extractor(name: &str) -> Option<Box<dyn DiffExtractor>> {
    match name {
        "action" => Some(Box::new(action::ActionExtractor)),
        "raft" => Some(Box::new(raft::RaftExtractor::new())),
        "zookeeper" | "zk" => Some(Box::new(zookeeper::ZkExtractor::new())),
        _ => None,
    }
}
