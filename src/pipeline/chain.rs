//! Cached view of pipeline topology.
//!
//! A `ChainView` describes every node reachable downstream of the node it was
//! computed from. The same `Rc<ChainView>` is attached to each covered node,
//! so a change reported through any of them marks the shared view dirty.
//! A clean view is always reused; a dirty view is only replaced when a caller
//! asks for the chain again.

use crate::stream::{NodeId, StreamRef};
use std::cell::Cell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

/// Snapshot of a pipeline's shape.
#[derive(Debug)]
pub struct ChainView {
    root: NodeId,
    /// Covered nodes in breadth-first order, root first.
    nodes: Vec<NodeId>,
    names: Vec<String>,
    /// Tracked connections between covered nodes.
    edges: Vec<(NodeId, NodeId)>,
    /// Covered nodes without downstream consumers.
    terminals: Vec<NodeId>,
    dirty: Cell<bool>,
}

impl ChainView {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    pub fn terminals(&self) -> &[NodeId] {
        &self.terminals
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Flag the view as stale. There is no way to clear the flag; a fresh
    /// view is computed instead.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }
}

/// Return the chain view attached to `node`, computing and attaching a new
/// one when none exists or the attached one is dirty.
pub fn chain_view(node: &StreamRef) -> Rc<ChainView> {
    if let Some(chain) = node.core().current_chain() {
        if !chain.is_dirty() {
            return chain;
        }
    }

    let (view, covered) = compute(node);
    let view = Rc::new(view);
    for covered_node in &covered {
        covered_node.core().set_chain(view.clone());
    }
    tracing::debug!(
        "Computed chain from {}: {} nodes, {} edges",
        view.root,
        view.nodes.len(),
        view.edges.len()
    );
    view
}

/// Breadth-first walk over tracked fanout. Cycles are visited once.
fn compute(root: &StreamRef) -> (ChainView, Vec<StreamRef>) {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<StreamRef> = VecDeque::new();
    let mut covered = Vec::new();
    let mut edges = Vec::new();
    let mut terminals = Vec::new();

    seen.insert(root.core().id());
    queue.push_back(root.clone());

    while let Some(node) = queue.pop_front() {
        let id = node.core().id();
        let downstream = node.core().downstream_nodes();
        if downstream.is_empty() {
            terminals.push(id);
        }
        for next in downstream {
            let next_id = next.core().id();
            edges.push((id, next_id));
            if seen.insert(next_id) {
                queue.push_back(next);
            }
        }
        covered.push(node);
    }

    let view = ChainView {
        root: root.core().id(),
        nodes: covered.iter().map(|n| n.core().id()).collect(),
        names: covered.iter().map(|n| n.core().name().to_string()).collect(),
        edges,
        terminals,
        dirty: Cell::new(false),
    };
    (view, covered)
}
