// src/graph/mod.rs

//! Task graph representation.
//!
//! - [`task`] defines the task row and its predecessor relations.
//! - [`graph`] holds one schedule's tasks plus successor adjacency and
//!   answers structural queries (successors, topological order).
//! - [`cycle`] rejects edges that would make the graph cyclic.
//! - [`notation`] formats and parses the compact `12FS+3` notation.

pub mod cycle;
pub mod graph;
pub mod notation;
pub mod task;

pub use cycle::CycleValidator;
pub use graph::{ScheduleSpan, TaskGraph};
pub use notation::parse_predecessor_list;
pub use task::{Predecessor, Task, TaskLock, TaskSnapshot};
