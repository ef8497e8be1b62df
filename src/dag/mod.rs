// src/dag/mod.rs

//! DAG representation and scheduling.
//!
//! - [`arena`] interns task names into stable [`NodeId`]s.
//! - [`graph`] holds the forward/reverse adjacency and in-degree table.
//! - [`order`] produces a Kahn-style topological order.
//! - [`scheduler`] is the per-session state machine that hands out runnable
//!   tasks and applies success/failure reports.
//! - [`task_manager`] is the contract the driver loop talks to.

pub mod arena;
pub mod graph;
pub mod order;
pub mod scheduler;
pub mod task_manager;
pub mod task_state;

/// Opaque, non-empty task identifier.
pub type TaskName = String;

pub use arena::{NodeId, TaskArena};
pub use graph::TaskGraph;
pub use order::topological_order;
pub use scheduler::Scheduler;
pub use task_manager::{QueueTaskManager, RunSummary, TaskManager};
pub use task_state::TaskState;
