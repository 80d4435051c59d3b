// src/graph/cycle.rs

//! Rejects predecessor edges that would introduce a self-loop or a cycle.

use tracing::debug;

use crate::errors::CycleError;
use crate::graph::graph::TaskGraph;

/// Stateless check run before any date recomputation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleValidator;

impl CycleValidator {
    /// Decide whether adding `from -> to` (`from` becomes a predecessor of
    /// `to`) keeps the graph acyclic.
    ///
    /// If `to` can already reach `from`, the new edge would close a cycle;
    /// the error carries the closed path `to -> ... -> from -> to`.
    pub fn validate_edge_addition(graph: &TaskGraph, from: &str, to: &str) -> Result<(), CycleError> {
        if from == to {
            return Err(CycleError::SelfReference {
                task: to.to_string(),
            });
        }
        if !graph.contains(from) {
            return Err(CycleError::UnknownTask(from.to_string()));
        }
        if !graph.contains(to) {
            return Err(CycleError::UnknownTask(to.to_string()));
        }

        match graph.find_path(to, from) {
            Some(mut path) => {
                path.push(to.to_string());
                debug!(from = %from, to = %to, ?path, "rejecting edge: would close a cycle");
                Err(CycleError::CycleDetected { path })
            }
            None => Ok(()),
        }
    }
}
