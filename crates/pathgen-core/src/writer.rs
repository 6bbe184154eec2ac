//! Corpus output: `<prefix>.node`, `<prefix>.edge`, `<prefix>.message`
//!
//! Line N of the edge file and line N of the message file always describe
//! the same path. A path's diffs are fully computed before either line is
//! written, so an extractor failure leaves no half-written path behind.

use crate::enumerate::{PathSink, TracePath};
use crate::error::{PathgenError, Result};
use crate::extractor::{DiffExtractor, DiffRecord};
use crate::graph::StateGraph;
use crate::model::StateId;
use crate::progress::Progress;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const NODE_EXT: &str = "node";
pub const EDGE_EXT: &str = "edge";
pub const MESSAGE_EXT: &str = "message";

/// The three files named by an output prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusPaths {
    pub node: PathBuf,
    pub edge: PathBuf,
    pub message: PathBuf,
}

impl CorpusPaths {
    pub fn from_prefix(prefix: &Path) -> Self {
        CorpusPaths {
            node: with_suffix(prefix, NODE_EXT),
            edge: with_suffix(prefix, EDGE_EXT),
            message: with_suffix(prefix, MESSAGE_EXT),
        }
    }
}

/// `prefix` + "." + `ext`, without touching any dot already in the prefix.
fn with_suffix(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Counts reported once the corpus is flushed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusSummary {
    pub nodes: u64,
    pub paths: u64,
    pub transitions: u64,
}

pub struct CorpusWriter<W: Write, E: DiffExtractor> {
    node_out: W,
    edge_out: W,
    message_out: W,
    extractor: E,
    summary: CorpusSummary,
}

impl<E: DiffExtractor> CorpusWriter<BufWriter<File>, E> {
    /// Create (truncating) all three files. Fails before anything is written
    /// if any of them cannot be opened.
    pub fn create(prefix: &Path, extractor: E) -> Result<Self> {
        let paths = CorpusPaths::from_prefix(prefix);
        let open = |path: &Path| {
            File::create(path)
                .map(BufWriter::new)
                .map_err(|e| PathgenError::io(path, e))
        };
        let node_out = open(&paths.node)?;
        let edge_out = open(&paths.edge)?;
        let message_out = open(&paths.message)?;
        tracing::debug!("Opened corpus files {:?}", paths);
        Ok(Self::from_writers(node_out, edge_out, message_out, extractor))
    }
}

impl<W: Write, E: DiffExtractor> CorpusWriter<W, E> {
    pub fn from_writers(node_out: W, edge_out: W, message_out: W, extractor: E) -> Self {
        CorpusWriter {
            node_out,
            edge_out,
            message_out,
            extractor,
            summary: CorpusSummary::default(),
        }
    }

    pub fn summary(&self) -> CorpusSummary {
        self.summary
    }

    /// Write `"<id> <label>"` for every state, in discovery order.
    pub fn write_nodes(&mut self, graph: &StateGraph, progress: &dyn Progress) -> Result<u64> {
        progress.set_total(Some(graph.node_count() as u64));
        for node in graph.nodes() {
            let label = node.label.as_deref().ok_or_else(|| unlabelled(node.id))?;
            writeln!(self.node_out, "{} {}", node.id, label)?;
            self.summary.nodes += 1;
            progress.advance(1);
        }
        progress.finish();
        tracing::info!("Wrote {} states", self.summary.nodes);
        Ok(self.summary.nodes)
    }

    /// Extract the diffs of one path and append its edge and message lines.
    pub fn write_path(&mut self, path: &TracePath<'_>) -> Result<()> {
        let graph = path.graph();
        let path_index = self.summary.paths;
        let transitions = path.transitions()?;

        let mut line = path.root().to_string();
        let mut diffs: Vec<DiffRecord> = Vec::with_capacity(transitions.len());
        for t in &transitions {
            let prev = state_label(graph, t.src)?;
            let cur = state_label(graph, t.dst)?;
            let records = self
                .extractor
                .extract(&t.action, prev, cur)
                .map_err(|source| PathgenError::Extract {
                    path_index,
                    action: t.action.clone(),
                    src: t.src,
                    dst: t.dst,
                    source,
                })?;
            diffs.extend(records);

            line.push(' ');
            line.push_str(&t.action);
            line.push(' ');
            line.push_str(&t.dst.to_string());
        }

        writeln!(self.edge_out, "{line}")?;
        serde_json::to_writer(&mut self.message_out, &diffs)?;
        self.message_out.write_all(b"\n")?;

        self.summary.paths += 1;
        self.summary.transitions += transitions.len() as u64;
        tracing::debug!("Path {}: {}", path_index, line);
        Ok(())
    }

    /// Flush all three outputs.
    pub fn finish(&mut self) -> Result<CorpusSummary> {
        self.node_out.flush()?;
        self.edge_out.flush()?;
        self.message_out.flush()?;
        Ok(self.summary)
    }

    /// Hand back the node, edge and message writers.
    pub fn into_writers(self) -> (W, W, W) {
        (self.node_out, self.edge_out, self.message_out)
    }
}

impl<W: Write, E: DiffExtractor> PathSink for CorpusWriter<W, E> {
    fn accept(&mut self, path: &TracePath<'_>) -> Result<()> {
        self.write_path(path)
    }
}

fn unlabelled(id: StateId) -> PathgenError {
    PathgenError::InvalidGraph(format!("state {id} is referenced but never labelled"))
}

fn state_label(graph: &StateGraph, id: StateId) -> Result<&str> {
    graph.node(id)?.label.as_deref().ok_or_else(|| unlabelled(id))
}
