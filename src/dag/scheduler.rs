// src/dag/scheduler.rs

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, info, warn};

use crate::dag::TaskName;
use crate::dag::arena::{NodeId, TaskArena};
use crate::dag::graph::TaskGraph;
use crate::dag::order::topological_order;
use crate::dag::task_manager::{RunSummary, TaskManager};
use crate::dag::task_state::TaskState;

/// Dependency-graph scheduler for one session.
///
/// It is responsible for:
/// - turning precedence edges into a candidate execution order
/// - handing out the next runnable task on demand
/// - removing succeeded tasks and releasing their sole dependents
/// - removing failed tasks together with everything downstream of them
/// - rebuilding the order after every report
///
/// The scheduler assumes the edges form a DAG. Tasks on a cycle never
/// reach in-degree zero and are never handed out.
#[derive(Debug, Clone)]
pub struct Scheduler {
    arena: TaskArena,
    graph: TaskGraph,
    /// Indexed by [`NodeId::index`].
    states: Vec<TaskState>,
    /// Candidate order from the last topological sort.
    tasks_order_queue: VecDeque<NodeId>,
    /// Tasks with no remaining edges, runnable as soon as they are popped.
    independent_queue: VecDeque<NodeId>,
    success_tasks: BTreeSet<NodeId>,
    /// Failed task -> tasks made unreachable by it.
    failed_tasks: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Scheduler {
    /// Build a session from `(upstream, downstream)` precedence pairs.
    pub fn new<I, U, D>(edges: I) -> Self
    where
        I: IntoIterator<Item = (U, D)>,
        U: AsRef<str>,
        D: AsRef<str>,
    {
        Self::with_tasks(std::iter::empty::<&str>(), edges)
    }

    /// Build a session from the full task list plus precedence pairs.
    ///
    /// Tasks that appear in no edge start out in the independent queue.
    pub fn with_tasks<T, N, I, U, D>(tasks: T, edges: I) -> Self
    where
        T: IntoIterator<Item = N>,
        N: AsRef<str>,
        I: IntoIterator<Item = (U, D)>,
        U: AsRef<str>,
        D: AsRef<str>,
    {
        let mut arena = TaskArena::new();
        for task in tasks {
            arena.intern(task.as_ref());
        }

        let edges: Vec<(NodeId, NodeId)> = edges
            .into_iter()
            .map(|(u, d)| (arena.intern(u.as_ref()), arena.intern(d.as_ref())))
            .collect();

        let states = vec![TaskState::Pending; arena.len()];
        let mut scheduler = Self {
            arena,
            graph: TaskGraph::from_edges(&edges),
            states,
            tasks_order_queue: VecDeque::new(),
            independent_queue: VecDeque::new(),
            success_tasks: BTreeSet::new(),
            failed_tasks: BTreeMap::new(),
        };
        scheduler.refresh_order_queue();

        info!(
            tasks = scheduler.arena.len(),
            edges = scheduler.graph.edge_count(),
            "scheduler: session created"
        );

        scheduler
    }

    /// `true` when both the order queue and the independent queue are empty.
    pub fn is_empty(&self) -> bool {
        self.tasks_order_queue.is_empty() && self.independent_queue.is_empty()
    }

    /// Hand out the next runnable task.
    ///
    /// The head of the order queue is returned only if all of its direct
    /// dependencies have succeeded; otherwise the independent queue is tried
    /// so that a released task is not starved behind a blocked head.
    /// Returns `None` when nothing can run right now, which is distinct from
    /// [`Scheduler::is_empty`].
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<TaskName> {
        if let Some(&head) = self.tasks_order_queue.front() {
            if self.can_execute_id(head) {
                self.tasks_order_queue.pop_front();
                return Some(self.dispatch(head));
            }
            debug!(
                task = %self.arena.name(head),
                "scheduler: head of order queue still waiting on dependencies"
            );
        }

        if let Some(id) = self.independent_queue.pop_front() {
            return Some(self.dispatch(id));
        }

        None
    }

    /// Record the final outcome of `task` and rebuild the order queue.
    ///
    /// Only names previously returned by [`Scheduler::next`] should be
    /// reported; other names are accepted but logged.
    pub fn report(&mut self, task: &str, success: bool) {
        match self.arena.get(task) {
            None => warn!(task = %task, "scheduler: report for a task this session never saw"),
            Some(id) if self.state(id) != TaskState::Dispatched => debug!(
                task = %task,
                state = %self.state(id),
                "scheduler: report for a task that was not dispatched"
            ),
            Some(_) => {}
        }

        if success {
            self.remove_success_task(task);
        } else {
            self.remove_failed_task(task);
        }

        self.update_tasks_order_queue();
    }

    /// Whether every direct dependency of `task` has succeeded.
    ///
    /// A task without recorded dependencies is always ready.
    pub fn can_execute(&self, task: &str) -> bool {
        match self.arena.get(task) {
            Some(id) => self.can_execute_id(id),
            None => true,
        }
    }

    /// Remove `target` and everything downstream of it.
    ///
    /// Every task reachable from `target` in the forward graph is recorded
    /// as unreachable under `target` itself, which is registered as a failed
    /// root even if it has no dependents.
    pub fn remove_failed_task(&mut self, target: &str) {
        let root = self.id_for(target);
        self.set_state(root, TaskState::Failed);

        let mut casualties = BTreeSet::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            let Some(dependents) = self.graph.take_dependents(node) else {
                continue;
            };
            for child in dependents {
                if casualties.insert(child) {
                    stack.push(child);
                }
            }
        }

        // Only reachable from itself through a cycle.
        casualties.remove(&root);

        self.graph.detach(root);
        for &node in &casualties {
            self.graph.detach(node);
            if !self.state(node).is_terminal() {
                self.set_state(node, TaskState::Unreachable);
            }
        }

        let removed = |n: &NodeId| *n == root || casualties.contains(n);
        self.tasks_order_queue.retain(|n| !removed(n));
        self.independent_queue.retain(|n| !removed(n));

        warn!(
            task = %target,
            unreachable = ?self.names(casualties.iter().copied()),
            "scheduler: task failed; downstream tasks are unreachable"
        );

        self.failed_tasks
            .entry(root)
            .or_default()
            .extend(casualties);
    }

    /// Mark `target` as succeeded and release tasks that only waited on it.
    ///
    /// A released task must have `target` as its sole remaining dependency
    /// and no dependents of its own; it goes to the independent queue.
    /// Tasks with dependents of their own resurface in the rebuilt order.
    pub fn remove_success_task(&mut self, target: &str) {
        let id = self.id_for(target);
        self.set_state(id, TaskState::Done);
        self.success_tasks.insert(id);
        self.independent_queue.retain(|&n| n != id);

        if self.graph.take_dependents(id).is_none() {
            debug!(task = %target, "scheduler: succeeded task has no dependents");
            return;
        }

        let released: Vec<NodeId> = self
            .graph
            .reverse()
            .iter()
            .filter(|(_, deps)| deps.len() == 1 && deps.contains(&id))
            .map(|(&node, _)| node)
            .filter(|&node| self.graph.is_sink(node))
            .filter(|&node| {
                self.state(node) == TaskState::Pending && !self.independent_queue.contains(&node)
            })
            .collect();

        for node in released {
            debug!(
                task = %self.arena.name(node),
                after = %target,
                "scheduler: released as independent task"
            );
            self.independent_queue.push_back(node);
        }
    }

    /// Rebuild graph, in-degree table and order queue from the remaining
    /// edges.
    ///
    /// Must run after every removal so no queue references a removed task.
    pub fn update_tasks_order_queue(&mut self) {
        let edges = self.graph.to_edges();
        self.graph = TaskGraph::from_edges(&edges);
        self.refresh_order_queue();

        debug!(
            order = ?self.order_queue(),
            independent = ?self.independent_queue(),
            "scheduler: rebuilt order queue"
        );
    }

    /// Current candidate order.
    pub fn order_queue(&self) -> Vec<&str> {
        self.tasks_order_queue
            .iter()
            .map(|&id| self.arena.name(id))
            .collect()
    }

    /// Tasks waiting in the independent queue, in pop order.
    pub fn independent_queue(&self) -> Vec<&str> {
        self.independent_queue
            .iter()
            .map(|&id| self.arena.name(id))
            .collect()
    }

    pub fn success_tasks(&self) -> BTreeSet<TaskName> {
        self.names(self.success_tasks.iter().copied())
    }

    /// Failed task -> tasks that became unreachable because of it.
    pub fn failed_tasks(&self) -> BTreeMap<TaskName, BTreeSet<TaskName>> {
        self.failed_tasks
            .iter()
            .map(|(&root, lost)| {
                (
                    self.arena.name(root).to_string(),
                    self.names(lost.iter().copied()),
                )
            })
            .collect()
    }

    /// Tasks that still have an entry in the forward graph.
    pub fn graph_tasks(&self) -> Vec<&str> {
        self.graph.nodes().map(|id| self.arena.name(id)).collect()
    }

    /// Direct dependents of `task`, or `None` if it has no forward entry.
    pub fn dependents_of(&self, task: &str) -> Option<BTreeSet<TaskName>> {
        let id = self.arena.get(task)?;
        let dependents = self.graph.dependents_of(id)?;
        Some(self.names(dependents.iter().copied()))
    }

    /// Remaining direct dependencies of `task` according to the last rebuild.
    pub fn in_degree_of(&self, task: &str) -> Option<usize> {
        self.graph.in_degree_of(self.arena.get(task)?)
    }

    /// Lifecycle state of `task`, or `None` for names never seen.
    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.arena.get(task).map(|id| self.state(id))
    }

    /// Every task name known to this session.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.arena.ids().map(|id| self.arena.name(id))
    }

    /// Tasks still pending (not yet handed out).
    pub fn pending_tasks(&self) -> Vec<TaskName> {
        self.arena
            .ids()
            .filter(|&id| self.state(id) == TaskState::Pending)
            .map(|id| self.arena.name(id).to_string())
            .collect()
    }

    fn can_execute_id(&self, id: NodeId) -> bool {
        self.graph
            .dependencies_of(id)
            .is_none_or(|deps| deps.iter().all(|d| self.success_tasks.contains(d)))
    }

    fn refresh_order_queue(&mut self) {
        let order = topological_order(&self.graph, self.graph.in_degree().clone());
        self.tasks_order_queue = order
            .into_iter()
            .filter(|&id| self.state(id) == TaskState::Pending)
            .collect();

        // Pending tasks left without any edge can run at any time.
        let isolated: Vec<NodeId> = self
            .arena
            .ids()
            .filter(|&id| {
                self.state(id) == TaskState::Pending
                    && !self.graph.contains(id)
                    && !self.independent_queue.contains(&id)
            })
            .collect();

        for id in isolated {
            debug!(task = %self.arena.name(id), "scheduler: task has no remaining edges");
            self.independent_queue.push_back(id);
        }
    }

    fn dispatch(&mut self, id: NodeId) -> TaskName {
        self.set_state(id, TaskState::Dispatched);
        let name = self.arena.name(id).to_string();
        debug!(task = %name, "scheduler: dispatching task");
        name
    }

    fn id_for(&mut self, task: &str) -> NodeId {
        let id = self.arena.intern(task);
        if id.index() >= self.states.len() {
            self.states.resize(id.index() + 1, TaskState::Pending);
        }
        id
    }

    fn state(&self, id: NodeId) -> TaskState {
        self.states[id.index()]
    }

    fn set_state(&mut self, id: NodeId, state: TaskState) {
        self.states[id.index()] = state;
    }

    fn names(&self, ids: impl Iterator<Item = NodeId>) -> BTreeSet<TaskName> {
        ids.map(|id| self.arena.name(id).to_string()).collect()
    }
}

impl TaskManager for Scheduler {
    fn is_empty(&self) -> bool {
        Scheduler::is_empty(self)
    }

    fn next(&mut self) -> Option<TaskName> {
        Scheduler::next(self)
    }

    fn report(&mut self, task: &str, success: bool) {
        Scheduler::report(self, task, success)
    }

    fn result(&self) -> RunSummary {
        RunSummary {
            succeeded: self.success_tasks(),
            failed: self.failed_tasks(),
            not_started: self.pending_tasks().into_iter().collect(),
        }
    }

    fn unreachable_from(&self, task: &str) -> BTreeSet<TaskName> {
        self.arena
            .get(task)
            .and_then(|id| self.failed_tasks.get(&id))
            .map(|lost| self.names(lost.iter().copied()))
            .unwrap_or_default()
    }

    fn pending(&self) -> Vec<TaskName> {
        self.pending_tasks()
    }

    fn planned_order(&self) -> Vec<TaskName> {
        self.order_queue()
            .into_iter()
            .chain(self.independent_queue())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: [(&str, &str); 3] = [("A", "B"), ("A", "C"), ("B", "D")];

    fn set(items: &[&str]) -> BTreeSet<TaskName> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn initial_order_is_topological() {
        let scheduler = Scheduler::new(TREE);
        let order = scheduler.order_queue();

        assert!(
            order == ["A", "B", "C", "D"] || order == ["A", "C", "B", "D"],
            "unexpected order {order:?}"
        );
        assert!(scheduler.independent_queue().is_empty());
        assert!(!scheduler.is_empty());
    }

    #[test]
    fn failed_root_takes_all_descendants_with_it() {
        let mut scheduler = Scheduler::new(TREE);
        assert!(scheduler.failed_tasks().is_empty());

        scheduler.remove_failed_task("A");

        let failed = scheduler.failed_tasks();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed["A"], set(&["B", "C", "D"]));

        // Only the isolated sink entries survive.
        assert_eq!(scheduler.graph_tasks(), vec!["C", "D"]);
        assert_eq!(scheduler.dependents_of("C"), Some(BTreeSet::new()));
        assert_eq!(scheduler.dependents_of("D"), Some(BTreeSet::new()));
        assert_eq!(scheduler.dependents_of("A"), None);
        assert_eq!(scheduler.dependents_of("B"), None);

        assert_eq!(scheduler.state_of("A"), Some(TaskState::Failed));
        assert_eq!(scheduler.state_of("D"), Some(TaskState::Unreachable));
    }

    #[test]
    fn failed_leaf_is_registered_with_no_casualties() {
        let mut scheduler = Scheduler::new(TREE);
        scheduler.remove_failed_task("C");

        assert_eq!(scheduler.failed_tasks()["C"], BTreeSet::new());
    }

    #[test]
    fn success_releases_sole_dependent_sink() {
        let mut scheduler = Scheduler::new(TREE);
        scheduler.remove_success_task("A");

        assert_eq!(scheduler.success_tasks(), set(&["A"]));
        assert_eq!(scheduler.graph_tasks(), vec!["B", "C", "D"]);
        assert_eq!(scheduler.dependents_of("B"), Some(set(&["D"])));
        assert_eq!(scheduler.independent_queue(), vec!["C"]);

        // Order queue is stale until the rebuild.
        assert_eq!(scheduler.order_queue().len(), 4);

        scheduler.update_tasks_order_queue();
        assert_eq!(scheduler.order_queue(), vec!["B", "D"]);
        assert_eq!(scheduler.independent_queue(), vec!["C"]);
        assert_eq!(scheduler.in_degree_of("D"), Some(1));
        assert_eq!(scheduler.in_degree_of("B"), Some(0));
    }

    #[test]
    fn readiness_follows_successes() {
        let mut scheduler = Scheduler::new(TREE);

        assert!(scheduler.can_execute("A"));
        assert!(!scheduler.can_execute("B"));
        assert!(!scheduler.can_execute("C"));
        assert!(!scheduler.can_execute("D"));

        scheduler.remove_success_task("A");
        scheduler.update_tasks_order_queue();

        assert!(scheduler.can_execute("B"));
        assert!(scheduler.can_execute("C"));
        assert!(!scheduler.can_execute("D"));

        scheduler.remove_success_task("B");
        scheduler.update_tasks_order_queue();
        assert!(scheduler.can_execute("D"));
    }

    #[test]
    fn next_does_not_reoffer_unreported_head() {
        let mut scheduler = Scheduler::new(TREE);

        assert_eq!(scheduler.next().as_deref(), Some("A"));
        assert_eq!(scheduler.next(), None);
        assert!(!scheduler.is_empty());
        assert_eq!(scheduler.state_of("A"), Some(TaskState::Dispatched));

        scheduler.remove_success_task("A");
        scheduler.update_tasks_order_queue();

        assert_eq!(scheduler.next().as_deref(), Some("B"));
        assert_eq!(scheduler.next().as_deref(), Some("C"));
        assert_eq!(scheduler.next(), None);
    }

    #[test]
    fn failure_of_root_empties_session() {
        let mut scheduler = Scheduler::new(TREE);
        assert_eq!(scheduler.next().as_deref(), Some("A"));

        scheduler.remove_failed_task("A");
        scheduler.update_tasks_order_queue();

        assert_eq!(scheduler.next(), None);
        assert!(scheduler.is_empty());
        assert!(scheduler.pending_tasks().is_empty());
    }

    #[test]
    fn is_empty_tracks_unpopped_independent_tasks() {
        let mut scheduler = Scheduler::new(TREE);

        for task in ["A", "B", "D"] {
            scheduler.remove_success_task(task);
            scheduler.update_tasks_order_queue();
            // C was released but never popped.
            assert!(!scheduler.is_empty(), "empty after {task}");
        }

        assert_eq!(scheduler.independent_queue(), vec!["C"]);
    }

    #[test]
    fn duplicate_edges_do_not_double_count() {
        let twice = Scheduler::new([("A", "B"), ("A", "B")]);
        let once = Scheduler::new([("A", "B")]);

        assert_eq!(twice.in_degree_of("B"), Some(1));
        assert_eq!(once.in_degree_of("B"), twice.in_degree_of("B"));
    }

    #[test]
    fn empty_edge_list_is_immediately_empty() {
        let mut scheduler = Scheduler::new(Vec::<(String, String)>::new());
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.next(), None);
    }

    #[test]
    fn isolated_tasks_are_schedulable() {
        let mut scheduler = Scheduler::with_tasks(["lint", "A", "B"], [("A", "B")]);

        assert_eq!(scheduler.independent_queue(), vec!["lint"]);
        assert_eq!(scheduler.order_queue(), vec!["A", "B"]);

        assert_eq!(scheduler.next().as_deref(), Some("A"));
        assert_eq!(scheduler.next().as_deref(), Some("lint"));
        scheduler.report("lint", true);
        scheduler.report("A", true);
        assert_eq!(scheduler.next().as_deref(), Some("B"));
        scheduler.report("B", true);

        assert!(scheduler.is_empty());
        assert_eq!(scheduler.success_tasks(), set(&["A", "B", "lint"]));
    }

    #[test]
    fn multi_predecessor_task_waits_for_last_predecessor() {
        let mut scheduler = Scheduler::new([("A", "C"), ("B", "C")]);

        scheduler.remove_success_task("A");
        assert!(scheduler.independent_queue().is_empty());
        scheduler.update_tasks_order_queue();
        assert_eq!(scheduler.order_queue(), vec!["B", "C"]);
        assert!(!scheduler.can_execute("C"));

        scheduler.remove_success_task("B");
        assert_eq!(scheduler.independent_queue(), vec!["C"]);
        scheduler.update_tasks_order_queue();
        assert!(scheduler.order_queue().is_empty());
        assert_eq!(scheduler.next().as_deref(), Some("C"));
    }

    #[test]
    fn released_task_with_dependents_stays_in_order_queue() {
        let mut scheduler = Scheduler::new([("A", "B"), ("B", "C")]);

        scheduler.remove_success_task("A");
        assert!(scheduler.independent_queue().is_empty());
        scheduler.update_tasks_order_queue();
        assert_eq!(scheduler.order_queue(), vec!["B", "C"]);
        assert_eq!(scheduler.next().as_deref(), Some("B"));
    }

    #[test]
    fn diamond_failure_leaves_no_stale_edges() {
        // X -> B <- A, B -> C
        let mut scheduler = Scheduler::new([("A", "B"), ("X", "B"), ("B", "C")]);

        assert_eq!(scheduler.next().as_deref(), Some("A"));
        scheduler.report("A", false);

        assert_eq!(scheduler.failed_tasks()["A"], set(&["B", "C"]));
        assert!(!scheduler.order_queue().contains(&"B"));

        // X lost its only edge but must still run.
        assert_eq!(scheduler.next().as_deref(), Some("X"));
        scheduler.report("X", true);

        assert!(scheduler.is_empty());
        assert_eq!(scheduler.state_of("B"), Some(TaskState::Unreachable));
        assert_eq!(scheduler.state_of("C"), Some(TaskState::Unreachable));
    }

    #[test]
    fn shared_descendant_is_attributed_to_first_failure() {
        let mut scheduler = Scheduler::new([("A", "Z"), ("B", "Z")]);

        assert_eq!(scheduler.next().as_deref(), Some("A"));
        scheduler.report("A", false);
        assert_eq!(scheduler.next().as_deref(), Some("B"));
        scheduler.report("B", false);

        let failed = scheduler.failed_tasks();
        assert_eq!(failed["A"], set(&["Z"]));
        assert_eq!(failed["B"], BTreeSet::new());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cycle_members_are_never_handed_out() {
        let mut scheduler = Scheduler::new([("A", "B"), ("B", "C"), ("C", "B")]);

        assert_eq!(scheduler.order_queue(), vec!["A"]);
        assert_eq!(scheduler.next().as_deref(), Some("A"));
        scheduler.report("A", true);

        assert!(scheduler.is_empty());
        assert_eq!(scheduler.pending_tasks(), ["B", "C"]);

        let summary = TaskManager::result(&scheduler);
        assert_eq!(summary.not_started, set(&["B", "C"]));
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn unknown_report_is_tolerated() {
        let mut scheduler = Scheduler::new(TREE);
        scheduler.report("ghost", true);

        assert!(scheduler.success_tasks().contains("ghost"));
        assert_eq!(scheduler.state_of("ghost"), Some(TaskState::Done));
        assert_eq!(scheduler.next().as_deref(), Some("A"));
    }

    #[test]
    fn trait_result_reports_unreachable_sets() {
        let mut scheduler = Scheduler::new(TREE);
        let task = TaskManager::next(&mut scheduler).unwrap();
        TaskManager::report(&mut scheduler, &task, false);

        assert_eq!(scheduler.unreachable_from("A"), set(&["B", "C", "D"]));
        let summary = scheduler.result();
        assert_eq!(summary.unreachable(), set(&["B", "C", "D"]));
        assert!(summary.succeeded.is_empty());
        assert!(summary.not_started.is_empty());
    }
}
