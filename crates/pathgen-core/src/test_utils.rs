//! Test utilities for Pathgen

use crate::extractor::{DiffExtractor, DiffRecord, ParseError};
use crate::graph::StateGraph;
use crate::loader::GraphLoader;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Root 0; `0 -a-> 1 -b-> 2` and `0 -c-> 3`, with some dot noise around it.
pub const SAMPLE_DOT: &str = r#"strict digraph DiskGraph {
nodesep=0.35;
subgraph cluster_graph {
color="white";
0 [label="/\\ x = 0",style = filled]
0 -> 1 [label="a",color="black",fontcolor="black"];
1 [label="/\\ x = 1"];
1 -> 2 [label="b",color="black",fontcolor="black"];
2 [label="/\\ x = 2"];
0 -> 3 [label="c",color="black",fontcolor="black"];
3 [label="/\\ x = 3"];
{rank = same; 0;}
}
}
"#;

/// Diamond: `0 -> 1 -> 3 -> 4`, `0 -> 2 -> 3`. State 3 is a merge node.
pub const DIAMOND_DOT: &str = r#"0 [label="s0"]
0 -> 1 [label="left",color="black"];
0 -> 2 [label="right",color="black"];
1 [label="s1"]
2 [label="s2"]
1 -> 3 [label="join",color="black"];
2 -> 3 [label="join",color="black"];
3 [label="s3"]
3 -> 4 [label="done",color="black"];
4 [label="s4"]
{rank = same; 0;}
"#;

/// Two-state cycle hanging off the root: `0 -> 1 <-> 2`.
pub const CYCLE_DOT: &str = r#"0 [label="s0"]
0 -> 1 [label="go",color="black"];
1 [label="s1"]
1 -> 2 [label="ping",color="black"];
2 [label="s2"]
2 -> 1 [label="pong",color="black"];
{rank = same; 0;}
"#;

/// Load a graph from dot text.
pub fn graph_from_dot(dot: &str) -> StateGraph {
    GraphLoader::new()
        .load_reader(dot.as_bytes())
        .unwrap()
        .graph
}

/// Write dot text to a temporary file.
pub fn write_dot(dot: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.dot");
    fs::write(&path, dot).unwrap();
    (temp_dir, path)
}

/// One record per transition: `{"action": .., "from": .., "to": ..}`.
pub struct StubExtractor;

impl DiffExtractor for StubExtractor {
    fn extract(
        &self,
        action: &str,
        prev_state: &str,
        cur_state: &str,
    ) -> Result<Vec<DiffRecord>, ParseError> {
        Ok(vec![DiffRecord::from_value(serde_json::json!({
            "action": action,
            "from": prev_state,
            "to": cur_state,
        }))])
    }
}

/// Fails on one action, records everything else.
pub struct FailingExtractor {
    pub fail_on: &'static str,
}

impl DiffExtractor for FailingExtractor {
    fn extract(
        &self,
        action: &str,
        prev_state: &str,
        cur_state: &str,
    ) -> Result<Vec<DiffRecord>, ParseError> {
        if action == self.fail_on {
            return Err(ParseError::new(format!("cannot interpret '{action}'")));
        }
        StubExtractor.extract(action, prev_state, cur_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_graphs_load() {
        assert_eq!(graph_from_dot(SAMPLE_DOT).node_count(), 4);
        assert_eq!(graph_from_dot(DIAMOND_DOT).node_count(), 5);
        assert_eq!(graph_from_dot(CYCLE_DOT).edge_count(), 3);

        let (_dir, path) = write_dot(SAMPLE_DOT);
        assert!(path.exists());
    }
}
