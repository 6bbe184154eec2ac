//! Protocol-agnostic extractor: records the action, never reads the states

use super::TransitionDiff;
use pathgen_core::{DiffExtractor, DiffRecord, ParseError};

pub struct ActionExtractor;

impl DiffExtractor for ActionExtractor {
    fn extract(
        &self,
        action: &str,
        _prev_state: &str,
        _cur_state: &str,
    ) -> Result<Vec<DiffRecord>, ParseError> {
        TransitionDiff::<serde_json::Value>::new(action, Vec::new()).into_records()
    }
}
