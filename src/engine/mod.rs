// src/engine/mod.rs

//! Session driver.
//!
//! [`Driver`] pulls runnable tasks from a [`crate::dag::TaskManager`], runs
//! them through an [`crate::exec::ExecutorBackend`] with retries, records
//! outcomes in an [`crate::store::OutcomeStore`] and reports back until the
//! session is drained.

pub mod driver;

pub use driver::{Driver, execute_with_retries};
