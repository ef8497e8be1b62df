// src/dag/order.rs

//! Kahn-style topological ordering over a [`TaskGraph`].

use std::collections::{BTreeMap, VecDeque};

use crate::dag::arena::NodeId;
use crate::dag::graph::TaskGraph;

/// Produce a topological order of the nodes reachable by in-degree
/// relaxation.
///
/// `in_degree` is consumed; pass a copy if the table is still needed.
/// Ties are broken by ascending [`NodeId`], but any valid order is
/// acceptable to callers.
///
/// Nodes on a cycle, and anything only reachable through one, never reach
/// in-degree zero and are left out of the result.
pub fn topological_order(
    graph: &TaskGraph,
    mut in_degree: BTreeMap<NodeId, usize>,
) -> VecDeque<NodeId> {
    let mut order = VecDeque::with_capacity(in_degree.len());
    let mut ready: VecDeque<NodeId> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&node, _)| node)
        .collect();

    while let Some(current) = ready.pop_front() {
        order.push_back(current);

        let Some(dependents) = graph.dependents_of(current) else {
            continue;
        };

        for &next in dependents {
            if let Some(degree) = in_degree.get_mut(&next) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    ready.push_back(next);
                }
            }
        }
    }

    order
}
