// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::dag::arena::NodeId;

/// Adjacency view of the precedence edges of one scheduling session.
///
/// - `forward`: task -> tasks it directly enables (its dependents).
/// - `reverse`: task -> tasks it directly depends on.
/// - `in_degree`: task -> number of direct dependencies.
///
/// Every endpoint of every edge gets an entry in all three maps, even when
/// the set is empty or the count is zero.
///
/// Removals (`take_dependents`, `detach`) only touch `forward`; `reverse`
/// and `in_degree` are refreshed by rebuilding from [`TaskGraph::to_edges`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGraph {
    forward: BTreeMap<NodeId, BTreeSet<NodeId>>,
    reverse: BTreeMap<NodeId, BTreeSet<NodeId>>,
    in_degree: BTreeMap<NodeId, usize>,
}

impl TaskGraph {
    /// Build the graph from `(upstream, downstream)` pairs.
    ///
    /// A repeated edge is skipped, so in-degrees are never double counted.
    pub fn from_edges(edges: &[(NodeId, NodeId)]) -> Self {
        let mut graph = Self::default();

        for &(upstream, downstream) in edges {
            let dependents = graph.forward.entry(upstream).or_default();
            if !dependents.insert(downstream) {
                continue;
            }

            graph.forward.entry(downstream).or_default();
            graph.reverse.entry(upstream).or_default();
            graph
                .reverse
                .entry(downstream)
                .or_default()
                .insert(upstream);
            graph.in_degree.entry(upstream).or_insert(0);
            *graph.in_degree.entry(downstream).or_insert(0) += 1;
        }

        graph
    }

    /// Flatten the forward adjacency back into an edge list.
    pub fn to_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.forward
            .iter()
            .flat_map(|(&upstream, dependents)| {
                dependents.iter().map(move |&downstream| (upstream, downstream))
            })
            .collect()
    }

    /// Whether `node` still has an entry in the forward graph.
    pub fn contains(&self, node: NodeId) -> bool {
        self.forward.contains_key(&node)
    }

    /// Nodes with a forward entry, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.forward.keys().copied()
    }

    pub fn dependents_of(&self, node: NodeId) -> Option<&BTreeSet<NodeId>> {
        self.forward.get(&node)
    }

    pub fn dependencies_of(&self, node: NodeId) -> Option<&BTreeSet<NodeId>> {
        self.reverse.get(&node)
    }

    /// `true` if `node` has no forward entry or an empty one.
    pub fn is_sink(&self, node: NodeId) -> bool {
        self.forward.get(&node).is_none_or(|d| d.is_empty())
    }

    pub fn in_degree_of(&self, node: NodeId) -> Option<usize> {
        self.in_degree.get(&node).copied()
    }

    pub fn in_degree(&self) -> &BTreeMap<NodeId, usize> {
        &self.in_degree
    }

    pub fn reverse(&self) -> &BTreeMap<NodeId, BTreeSet<NodeId>> {
        &self.reverse
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Remove and return `node`'s dependents if it has any.
    ///
    /// A sink keeps its (empty) entry and yields `None`.
    pub(crate) fn take_dependents(&mut self, node: NodeId) -> Option<BTreeSet<NodeId>> {
        if self.is_sink(node) {
            return None;
        }
        self.forward.remove(&node)
    }

    /// Drop every forward edge that points at `node`.
    pub(crate) fn detach(&mut self, node: NodeId) {
        for dependents in self.forward.values_mut() {
            dependents.remove(&node);
        }
    }
}
