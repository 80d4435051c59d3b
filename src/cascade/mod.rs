// src/cascade/mod.rs

//! Date propagation.
//!
//! - [`engine`] recomputes start dates downstream of a dirty set.
//! - [`update`] describes the resulting batch of row changes.

pub mod engine;
pub mod update;

pub use engine::{CascadeEngine, CascadeOptions, ConstraintViolation};
pub use update::{TaskUpdate, UpdateSet};
