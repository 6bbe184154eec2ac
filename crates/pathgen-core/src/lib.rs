//! Pathgen Core: state graph, bounded path enumeration and trace corpus output

pub mod config;
pub mod enumerate;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod inspect;
pub mod loader;
pub mod model;
pub mod progress;
pub mod writer;


#[cfg(test)]
pub mod test_utils;

pub use config::{ConfigError, RunConfig};
pub use enumerate::{EnumerationStats, PathCollector, PathEnumerator, PathSink, TracePath, collect_paths};
pub use error::{PathgenError, Result};
pub use extractor::{DiffExtractor, DiffRecord, ParseError};
pub use graph::StateGraph;
pub use inspect::{NodeTable, read_path_line, render_path, unescape_label};
pub use loader::{DotLine, GraphLoader, LoadedGraph, count_lines};
pub use model::{EdgeId, StateId, StateNode, Transition};
pub use progress::{NoProgress, Progress};
pub use writer::{CorpusPaths, CorpusSummary, CorpusWriter};
