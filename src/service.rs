// src/service.rs

//! Async shell around the pure edit transaction.
//!
//! The service owns the per-schedule serialization: every call for the same
//! schedule id holds that schedule's lock from snapshot load to commit, so
//! edits to one schedule are strictly ordered, while different schedules
//! never contend. The transaction itself runs entirely in memory between
//! the load and the commit.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cascade::{CascadeOptions, UpdateSet};
use crate::edit::{CommittedEdit, EditTransaction, TaskEdit};
use crate::errors::{EditError, Result};
use crate::graph::TaskGraph;
use crate::store::ScheduleStore;
use crate::types::ScheduleId;

pub struct ScheduleService<S: ScheduleStore> {
    store: Arc<S>,
    transaction: EditTransaction,
    locks: StdMutex<HashMap<ScheduleId, Arc<Mutex<()>>>>,
}

impl<S: ScheduleStore> fmt::Debug for ScheduleService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleService")
            .field("transaction", &self.transaction)
            .finish_non_exhaustive()
    }
}

impl<S: ScheduleStore> ScheduleService<S> {
    pub fn new(store: S, options: CascadeOptions) -> Self {
        Self::with_shared_store(Arc::new(store), options)
    }

    pub fn with_shared_store(store: Arc<S>, options: CascadeOptions) -> Self {
        Self {
            store,
            transaction: EditTransaction::new(options),
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one edit to `schedule` and persist the resulting update set.
    pub async fn apply_edit(&self, schedule: &str, edit: TaskEdit) -> Result<UpdateSet> {
        self.apply_batch(schedule, vec![edit]).await
    }

    /// Apply several edits to `schedule` as one transaction.
    pub async fn apply_batch(&self, schedule: &str, edits: Vec<TaskEdit>) -> Result<UpdateSet> {
        self.transact(schedule, |tx, graph| tx.apply_batch(graph, edits)).await
    }

    /// Recompute every task of `schedule` and persist any drift.
    pub async fn recalculate(&self, schedule: &str) -> Result<UpdateSet> {
        self.transact(schedule, |tx, graph| tx.recalculate_all(graph)).await
    }

    /// Current state of `schedule`, read under its lock.
    pub async fn snapshot(&self, schedule: &str) -> Result<TaskGraph> {
        let lock = self.lock_for(schedule);
        let _guard = lock.lock().await;
        self.load_graph(schedule)
    }

    async fn transact<F>(&self, schedule: &str, run: F) -> Result<UpdateSet>
    where
        F: FnOnce(&EditTransaction, &TaskGraph) -> std::result::Result<CommittedEdit, EditError>,
    {
        let lock = self.lock_for(schedule);
        let _guard = lock.lock().await;
        debug!(schedule = %schedule, "acquired schedule lock");

        let graph = self.load_graph(schedule)?;
        let committed = run(&self.transaction, &graph)?;

        if committed.updates.is_empty() {
            debug!(schedule = %schedule, "no changes to commit");
            return Ok(committed.updates);
        }

        self.store.commit(schedule, &committed.updates)?;
        info!(
            schedule = %schedule,
            rows = committed.updates.len(),
            "schedule updated"
        );
        Ok(committed.updates)
    }

    fn load_graph(&self, schedule: &str) -> Result<TaskGraph> {
        let tasks = self.store.load(schedule)?;
        Ok(TaskGraph::load(tasks).map_err(EditError::from)?)
    }

    fn lock_for(&self, schedule: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(schedule.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
