//! Bounded path enumeration over a [`StateGraph`]
//!
//! Two passes share one per-edge `visited` array, reset at the start of each:
//!
//! - [`PathEnumerator::estimate_paths`] walks the graph once, marking every
//!   transition it takes and never taking a marked one again. It counts leaves
//!   reached, which is exact for trees and an undercount as soon as two walks
//!   merge. The number only sizes a progress bar.
//! - [`PathEnumerator::enumerate`] emits every walk from the root that ends at
//!   a leaf or after `step_limit` transitions, whichever comes first. It does
//!   not consult `visited`: a state reachable along several walks is expanded
//!   once per walk.
//!
//! Both passes use an explicit stack of `(state, next successor)` frames, so
//! depth is bounded by memory rather than by the call stack. Successors are
//! taken in discovery order; output order is fully deterministic.

use crate::error::{PathgenError, Result};
use crate::graph::StateGraph;
use crate::model::{EdgeId, StateId, Transition};
use crate::progress::Progress;

/// A completed walk: the root followed by `edges` in order.
#[derive(Debug, Clone, Copy)]
pub struct TracePath<'a> {
    graph: &'a StateGraph,
    root: StateId,
    edges: &'a [EdgeId],
}

impl<'a> TracePath<'a> {
    pub fn new(graph: &'a StateGraph, root: StateId, edges: &'a [EdgeId]) -> Self {
        TracePath { graph, root, edges }
    }

    pub fn graph(&self) -> &'a StateGraph {
        self.graph
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_ids(&self) -> &'a [EdgeId] {
        self.edges
    }

    /// Transitions in path order.
    pub fn transitions(&self) -> Result<Vec<&'a Transition>> {
        self.edges.iter().map(|&e| self.graph.transition(e)).collect()
    }

    /// `[root, n1, n2, ...]`.
    pub fn states(&self) -> Result<Vec<StateId>> {
        let mut states = Vec::with_capacity(self.edges.len() + 1);
        states.push(self.root);
        for t in self.transitions()? {
            states.push(t.dst);
        }
        Ok(states)
    }

    /// Action labels in path order.
    pub fn actions(&self) -> Result<Vec<&'a str>> {
        Ok(self
            .transitions()?
            .into_iter()
            .map(|t| t.action.as_str())
            .collect())
    }
}

/// Receives each completed path, in emission order.
pub trait PathSink {
    fn accept(&mut self, path: &TracePath<'_>) -> Result<()>;
}

/// Sink that keeps the state sequence of every path.
#[derive(Debug, Default, Clone)]
pub struct PathCollector {
    pub paths: Vec<Vec<StateId>>,
}

impl PathCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathSink for PathCollector {
    fn accept(&mut self, path: &TracePath<'_>) -> Result<()> {
        self.paths.push(path.states()?);
        Ok(())
    }
}

/// Counters from one exhaustive pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerationStats {
    /// Paths emitted.
    pub paths: u64,
    /// Paths that ended at a leaf.
    pub leaves: u64,
    /// Paths cut off by the step limit.
    pub truncated: u64,
    /// Longest emitted path, in transitions.
    pub max_transitions: usize,
}

pub struct PathEnumerator<'g> {
    graph: &'g StateGraph,
    step_limit: usize,
    visited: Vec<bool>,
}

impl<'g> PathEnumerator<'g> {
    pub fn new(graph: &'g StateGraph, step_limit: usize) -> Self {
        PathEnumerator {
            graph,
            step_limit,
            visited: vec![false; graph.edge_count()],
        }
    }

    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    /// Transitions marked during the most recent pass.
    pub fn visited_edges(&self) -> usize {
        self.visited.iter().filter(|&&v| v).count()
    }

    fn reset_visited(&mut self) {
        self.visited.clear();
        self.visited.resize(self.graph.edge_count(), false);
    }

    fn check_root(&self, root: StateId) -> Result<()> {
        if self.graph.node_count() == 0 {
            return Err(PathgenError::InvalidGraph("graph has no states".into()));
        }
        if self.graph.out_degree(root)? == 0 {
            return Err(PathgenError::InvalidGraph(format!(
                "root {root} has no outgoing transitions"
            )));
        }
        Ok(())
    }

    /// Approximate path count used to size progress reporting. Ignores the
    /// step limit.
    pub fn estimate_paths(&mut self, root: StateId, progress: &dyn Progress) -> Result<u64> {
        let graph = self.graph;
        self.reset_visited();
        self.check_root(root)?;
        progress.set_total(None);

        let mut count = 0u64;
        let mut stack: Vec<(StateId, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (state, next) = *frame;
            let successors = graph.successor_ids(state)?;
            let Some(&edge) = successors.get(next) else {
                stack.pop();
                continue;
            };
            frame.1 += 1;

            if self.visited[edge.0] {
                continue;
            }
            self.visited[edge.0] = true;

            let dst = graph.transition(edge)?.dst;
            if graph.out_degree(dst)? == 0 {
                count += 1;
                progress.advance(1);
            } else {
                stack.push((dst, 0));
            }
        }
        progress.finish();

        tracing::info!("Estimated {} paths from root {}", count, root);
        Ok(count)
    }

    /// Emit every walk from `root` that ends at a leaf or after `step_limit`
    /// transitions. Stops at the first error from `sink`.
    pub fn enumerate<S: PathSink + ?Sized>(
        &mut self,
        root: StateId,
        sink: &mut S,
        progress: &dyn Progress,
    ) -> Result<EnumerationStats> {
        let graph = self.graph;
        self.reset_visited();
        self.check_root(root)?;

        let mut stats = EnumerationStats::default();
        let mut path: Vec<EdgeId> = Vec::new();

        if self.step_limit == 0 {
            emit(graph, root, &path, false, sink, &mut stats)?;
            progress.advance(1);
            progress.finish();
            return Ok(stats);
        }

        // Invariant: path.len() == stack.len() - 1.
        let mut stack: Vec<(StateId, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (state, next) = *frame;
            let successors = graph.successor_ids(state)?;
            let Some(&edge) = successors.get(next) else {
                stack.pop();
                path.pop();
                continue;
            };
            frame.1 += 1;

            path.push(edge);
            let dst = graph.transition(edge)?.dst;
            let is_leaf = graph.out_degree(dst)? == 0;

            if is_leaf || path.len() >= self.step_limit {
                emit(graph, root, &path, is_leaf, sink, &mut stats)?;
                progress.advance(1);
                path.pop();
            } else {
                stack.push((dst, 0));
            }
        }
        progress.finish();

        tracing::info!(
            "Enumerated {} paths ({} reached a leaf, {} hit the step limit of {})",
            stats.paths,
            stats.leaves,
            stats.truncated,
            self.step_limit
        );
        Ok(stats)
    }
}

fn emit<S: PathSink + ?Sized>(
    graph: &StateGraph,
    root: StateId,
    path: &[EdgeId],
    is_leaf: bool,
    sink: &mut S,
    stats: &mut EnumerationStats,
) -> Result<()> {
    sink.accept(&TracePath::new(graph, root, path))?;
    stats.paths += 1;
    if is_leaf {
        stats.leaves += 1;
    } else {
        stats.truncated += 1;
    }
    stats.max_transitions = stats.max_transitions.max(path.len());
    Ok(())
}

/// Run the exhaustive pass and return the state sequence of every path.
pub fn collect_paths(graph: &StateGraph, root: StateId, step_limit: usize) -> Result<Vec<Vec<StateId>>> {
    let mut collector = PathCollector::new();
    PathEnumerator::new(graph, step_limit).enumerate(
        root,
        &mut collector,
        &crate::progress::NoProgress,
    )?;
    Ok(collector.paths)
}
