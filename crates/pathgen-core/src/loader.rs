//! Streaming loader for model-checker state graph dumps
//!
//! The input is a restricted subset of Graphviz dot. Three line shapes are
//! recognized, tried in this order:
//!
//! ```text
//! 3 -> 7 [label="SendRequest",color="black"];   transition
//! 7 [label="/\\ x = 1\n/\\ y = 2",style = filled] state label
//! {rank = same; 3;}                              root marker
//! ```
//!
//! Every other line is skipped. Files are read line by line, never whole.

use crate::error::{PathgenError, Result};
use crate::graph::StateGraph;
use crate::model::StateId;
use crate::progress::{NoProgress, Progress};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

const LABEL: &str = r#"\[label="((?:[^"\\]|\\.)*)""#;

static EDGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*([-\d]+) -> ([-\d]+) {LABEL}")).expect("edge pattern compiles")
});

static NODE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*([-\d]+) {LABEL}")).expect("node pattern compiles")
});

static ROOT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\{\s*rank\s*=\s*same;\s*([-\d]+);\s*\}").expect("root pattern compiles")
});

/// One classified input line. Ids are still unparsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotLine<'a> {
    Edge {
        src: &'a str,
        dst: &'a str,
        action: &'a str,
    },
    Label {
        id: &'a str,
        label: &'a str,
    },
    Root {
        id: &'a str,
    },
    Other,
}

impl<'a> DotLine<'a> {
    /// Classify a line by the first grammar it matches.
    pub fn classify(line: &'a str) -> Self {
        if let Some(caps) = EDGE_LINE.captures(line) {
            return DotLine::Edge {
                src: caps.get(1).map_or("", |m| m.as_str()),
                dst: caps.get(2).map_or("", |m| m.as_str()),
                action: caps.get(3).map_or("", |m| m.as_str()),
            };
        }
        if let Some(caps) = NODE_LINE.captures(line) {
            return DotLine::Label {
                id: caps.get(1).map_or("", |m| m.as_str()),
                label: caps.get(2).map_or("", |m| m.as_str()),
            };
        }
        if let Some(caps) = ROOT_LINE.captures(line) {
            return DotLine::Root {
                id: caps.get(1).map_or("", |m| m.as_str()),
            };
        }
        DotLine::Other
    }
}

/// Result of loading a graph file.
#[derive(Debug)]
pub struct LoadedGraph {
    pub graph: StateGraph,
    /// State named by the root marker, if the file had one.
    pub root: Option<StateId>,
    /// Lines read.
    pub lines: usize,
    /// Lines that matched no grammar.
    pub skipped: usize,
}

/// Builds a [`StateGraph`] from a dot dump, reporting one unit of progress
/// per line read.
pub struct GraphLoader<'p> {
    progress: &'p dyn Progress,
}

impl GraphLoader<'static> {
    pub fn new() -> Self {
        GraphLoader {
            progress: &NoProgress,
        }
    }
}

impl Default for GraphLoader<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> GraphLoader<'p> {
    pub fn with_progress(progress: &'p dyn Progress) -> Self {
        GraphLoader { progress }
    }

    /// Load the graph stored at `path`.
    pub fn load_path(&self, path: &Path) -> Result<LoadedGraph> {
        let file = File::open(path).map_err(|e| PathgenError::io(path, e))?;
        tracing::info!("Loading state graph from {}", path.display());
        self.load_reader(BufReader::new(file))
    }

    /// Load a graph from any buffered reader.
    pub fn load_reader<R: BufRead>(&self, mut reader: R) -> Result<LoadedGraph> {
        let mut graph = StateGraph::new();
        let mut buf = String::new();
        let mut lines = 0;
        let mut skipped = 0;

        loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                break;
            }
            lines += 1;
            let line = buf.trim_end_matches(['\n', '\r']);
            if !apply_line(&mut graph, line, lines)? {
                skipped += 1;
            }
            self.progress.advance(1);
        }
        self.progress.finish();

        tracing::info!(
            "Loaded {} states and {} transitions from {} lines ({} skipped)",
            graph.node_count(),
            graph.edge_count(),
            lines,
            skipped
        );

        let root = graph.root_marker();
        Ok(LoadedGraph {
            graph,
            root,
            lines,
            skipped,
        })
    }
}

/// Apply one line to the graph. Returns `false` if the line was skipped.
fn apply_line(graph: &mut StateGraph, line: &str, line_no: usize) -> Result<bool> {
    match DotLine::classify(line) {
        DotLine::Edge { src, dst, action } => {
            let src = parse_id(src, line_no)?;
            let dst = parse_id(dst, line_no)?;
            if !graph.contains(src) {
                return Err(PathgenError::Format {
                    line: line_no,
                    message: format!("transition from undeclared state {src}"),
                });
            }
            graph.add_transition(src, dst, action)?;
        }
        DotLine::Label { id, label } => {
            let id = parse_id(id, line_no)?;
            graph
                .add_state(id, Some(label.to_string()))
                .map_err(|e| match e {
                    PathgenError::DuplicateLabel { id, .. } => {
                        PathgenError::DuplicateLabel { line: line_no, id }
                    }
                    other => other,
                })?;
        }
        DotLine::Root { id } => {
            let id = parse_id(id, line_no)?;
            tracing::debug!("Root marker on line {}: {}", line_no, id);
            graph.set_root_marker(id);
        }
        DotLine::Other => return Ok(false),
    }
    Ok(true)
}

fn parse_id(text: &str, line_no: usize) -> Result<StateId> {
    text.parse::<i64>()
        .map(StateId)
        .map_err(|e| PathgenError::Format {
            line: line_no,
            message: format!("bad state id '{text}': {e}"),
        })
}

/// Count the lines of a file, for sizing a progress bar before loading.
pub fn count_lines(path: &Path) -> Result<u64> {
    let file = File::open(path).map_err(|e| PathgenError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut count = 0;
    loop {
        let chunk = reader.fill_buf().map_err(|e| PathgenError::io(path, e))?;
        if chunk.is_empty() {
            break;
        }
        count += chunk.iter().filter(|&&b| b == b'\n').count() as u64;
        let len = chunk.len();
        reader.consume(len);
    }
    Ok(count)
}
