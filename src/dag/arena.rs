// src/dag/arena.rs

//! Task-name interner.
//!
//! Every task name seen during a scheduling session gets a stable
//! [`NodeId`]. The graph, the queues and the outcome sets all work on ids;
//! names are only resolved at the API boundary.

use std::collections::HashMap;

use crate::dag::TaskName;

/// Index of a task inside a [`TaskArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Append-only table of task names.
///
/// Ids are handed out in first-seen order and never reused, so they stay
/// valid across graph rebuilds.
#[derive(Debug, Clone, Default)]
pub struct TaskArena {
    names: Vec<TaskName>,
    index: HashMap<TaskName, NodeId>,
}

impl TaskArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, allocating one if the name is new.
    pub fn intern(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = NodeId(self.names.len());
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Name behind an id handed out by this arena.
    pub fn name(&self, id: NodeId) -> &str {
        &self.names[id.0]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All ids in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.names.len()).map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable_and_ordered() {
        let mut arena = TaskArena::new();
        let a = arena.intern("A");
        let b = arena.intern("B");

        assert_eq!(arena.intern("A"), a);
        assert!(a < b);
        assert_eq!(arena.name(b), "B");
        assert_eq!(arena.get("C"), None);
        assert_eq!(arena.ids().collect::<Vec<_>>(), vec![a, b]);
    }
}
