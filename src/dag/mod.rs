// src/dag/mod.rs

//! Task graph representation and planning.
//!
//! - [`graph`] holds the task graph and computes execution plans.
//! - [`step`] defines the unit handed to the executor.

pub mod graph;
pub mod step;

pub use graph::TaskGraph;
pub use step::ScheduledStep;
