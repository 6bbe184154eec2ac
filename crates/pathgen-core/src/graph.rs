//! State graph wrapper around `petgraph::DiGraph` with model-checker state ids

use crate::error::{PathgenError, Result};
use crate::model::*;
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use std::collections::HashMap;

/// Outgoing transitions of one state in file-discovery order, plus a
/// destination index for O(1) `(src, dst)` lookup.
#[derive(Debug, Default)]
struct Adjacency {
    edges: Vec<EdgeId>,
    by_dst: HashMap<StateId, EdgeId>,
}

/// The state graph. Nodes and transitions live in flat arenas owned by the
/// inner `DiGraph`; transitions refer to their endpoints by id only.
pub struct StateGraph {
    inner: DiGraph<StateNode, Transition>,
    index: HashMap<StateId, NodeIndex>,
    /// Parallel to the node arena.
    adjacency: Vec<Adjacency>,
    root_marker: Option<StateId>,
}

impl std::fmt::Debug for StateGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .field("root_marker", &self.root_marker)
            .finish()
    }
}

impl StateGraph {
    pub fn new() -> Self {
        StateGraph {
            inner: DiGraph::new(),
            index: HashMap::new(),
            adjacency: Vec::new(),
            root_marker: None,
        }
    }

    /// Total number of states.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of distinct `(src, dst)` transitions.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.index.contains_key(&id)
    }

    fn index_of(&self, id: StateId) -> Result<NodeIndex> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| PathgenError::state_not_found(id))
    }

    /// Get a state by id.
    pub fn node(&self, id: StateId) -> Result<&StateNode> {
        let idx = self.index_of(id)?;
        self.inner
            .node_weight(idx)
            .ok_or_else(|| PathgenError::state_not_found(id))
    }

    /// Id of the transition from `src` to `dst`.
    pub fn edge_id(&self, src: StateId, dst: StateId) -> Result<EdgeId> {
        let idx = self.index_of(src)?;
        self.adjacency[idx.index()]
            .by_dst
            .get(&dst)
            .copied()
            .ok_or_else(|| PathgenError::NotFound(format!("transition {src} -> {dst}")))
    }

    /// Get the transition from `src` to `dst`.
    pub fn edge(&self, src: StateId, dst: StateId) -> Result<&Transition> {
        let id = self.edge_id(src, dst)?;
        self.transition(id)
    }

    /// Get a transition by arena id.
    pub fn transition(&self, id: EdgeId) -> Result<&Transition> {
        self.inner
            .edge_weight(EdgeIndex::new(id.0))
            .ok_or_else(|| PathgenError::NotFound(format!("transition #{}", id.0)))
    }

    /// All state ids in discovery order.
    pub fn node_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.inner.node_weights().map(|n| n.id)
    }

    /// All states in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &StateNode> {
        self.inner.node_weights()
    }

    /// Outgoing transition ids of a state, in discovery order.
    pub fn successor_ids(&self, id: StateId) -> Result<&[EdgeId]> {
        let idx = self.index_of(id)?;
        Ok(&self.adjacency[idx.index()].edges)
    }

    /// Outgoing transitions of a state, in discovery order.
    pub fn successor_edges(&self, id: StateId) -> Result<impl Iterator<Item = &Transition>> {
        let ids = self.successor_ids(id)?;
        Ok(ids
            .iter()
            .filter_map(move |e| self.inner.edge_weight(EdgeIndex::new(e.0))))
    }

    pub fn out_degree(&self, id: StateId) -> Result<usize> {
        Ok(self.successor_ids(id)?.len())
    }

    pub fn in_degree(&self, id: StateId) -> Result<usize> {
        let idx = self.index_of(id)?;
        Ok(self
            .inner
            .neighbors_directed(idx, Direction::Incoming)
            .count())
    }

    /// Add a state, or fill in the label of a placeholder.
    ///
    /// A `None` label on an existing state is a no-op. A second non-null
    /// label is rejected with [`PathgenError::DuplicateLabel`] (line 0; the
    /// loader supplies the real line).
    pub fn add_state(&mut self, id: StateId, label: Option<String>) -> Result<StateId> {
        if let Some(&idx) = self.index.get(&id) {
            if let Some(label) = label {
                let node = &mut self.inner[idx];
                if node.label.is_some() {
                    return Err(PathgenError::DuplicateLabel { line: 0, id });
                }
                node.label = Some(label);
            }
            return Ok(id);
        }

        let idx = self.inner.add_node(StateNode::new(id, label));
        debug_assert_eq!(idx.index(), self.adjacency.len());
        self.index.insert(id, idx);
        self.adjacency.push(Adjacency::default());
        Ok(id)
    }

    /// Add a transition. The source must already exist; an unseen destination
    /// is created as an unlabelled placeholder. Re-declaring an existing
    /// `(src, dst)` pair returns the existing transition.
    pub fn add_transition(
        &mut self,
        src: StateId,
        dst: StateId,
        action: impl Into<String>,
    ) -> Result<EdgeId> {
        let action = action.into();
        let src_idx = self.index_of(src)?;

        if let Some(&existing) = self.adjacency[src_idx.index()].by_dst.get(&dst) {
            let kept = &self.inner[EdgeIndex::new(existing.0)];
            if kept.action != action {
                tracing::warn!(
                    "Transition {} -> {} redeclared as '{}', keeping '{}'",
                    src,
                    dst,
                    action,
                    kept.action
                );
            }
            return Ok(existing);
        }

        if !self.contains(dst) {
            self.add_state(dst, None)?;
        }
        let dst_idx = self.index_of(dst)?;

        let idx = self
            .inner
            .add_edge(src_idx, dst_idx, Transition::new(src, dst, action));
        let id = EdgeId(idx.index());
        let adjacency = &mut self.adjacency[src_idx.index()];
        adjacency.edges.push(id);
        adjacency.by_dst.insert(dst, id);
        Ok(id)
    }

    /// Record the state named by the file's root marker.
    pub fn set_root_marker(&mut self, id: StateId) {
        if let Some(previous) = self.root_marker.replace(id) {
            if previous != id {
                tracing::warn!("Root marker {} replaced by {}", previous, id);
            }
        }
    }

    pub fn root_marker(&self) -> Option<StateId> {
        self.root_marker
    }

    /// States with no incoming and at least one outgoing transition, in
    /// discovery order.
    pub fn root_candidates(&self) -> Vec<StateId> {
        self.inner
            .node_indices()
            .filter(|&idx| {
                !self.adjacency[idx.index()].edges.is_empty()
                    && self
                        .inner
                        .neighbors_directed(idx, Direction::Incoming)
                        .next()
                        .is_none()
            })
            .map(|idx| self.inner[idx].id)
            .collect()
    }

    /// Check that exactly one root exists and agrees with the root marker,
    /// and return it.
    pub fn validate_root(&self) -> Result<StateId> {
        if self.node_count() == 0 {
            return Err(PathgenError::InvalidGraph("graph has no states".into()));
        }

        let candidates = self.root_candidates();
        let root = match candidates.as_slice() {
            [] => {
                return Err(PathgenError::InvalidGraph(
                    "no state has zero in-degree and positive out-degree".into(),
                ));
            }
            [only] => *only,
            many => {
                let listed: Vec<String> = many.iter().map(|id| id.to_string()).collect();
                return Err(PathgenError::InvalidGraph(format!(
                    "multiple root candidates: {}",
                    listed.join(", ")
                )));
            }
        };

        match self.root_marker {
            Some(marked) if marked != root => Err(PathgenError::InvalidGraph(format!(
                "root marker names state {marked}, but the only root candidate is {root}"
            ))),
            _ => Ok(root),
        }
    }

    /// Number of states with at least one incoming and no outgoing transition.
    pub fn leaf_count(&self) -> usize {
        self.inner
            .node_indices()
            .filter(|&idx| {
                self.adjacency[idx.index()].edges.is_empty()
                    && self
                        .inner
                        .neighbors_directed(idx, Direction::Incoming)
                        .next()
                        .is_some()
            })
            .count()
    }

    /// States that were referenced by a transition but never labelled.
    pub fn unlabelled(&self) -> impl Iterator<Item = StateId> + '_ {
        self.nodes().filter(|n| !n.is_labelled()).map(|n| n.id)
    }
}

impl Default for StateGraph {
    fn default() -> Self {
        Self::new()
    }
}
