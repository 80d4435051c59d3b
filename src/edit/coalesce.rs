// src/edit/coalesce.rs

use tracing::debug;

use crate::edit::TaskEdit;

/// Pending edits collected while a gesture is in progress (e.g. a drag that
/// emits several intermediate positions).
///
/// Semantics:
/// - A later edit of the same kind for the same task drops the earlier
///   pending one, since every edit is a full replacement of the fields it
///   touches. The later edit keeps its own position at the end of the queue,
///   so edits recorded in between still apply before it. Ten intermediate
///   drag positions therefore become one `ChangeStartDate` carrying the
///   final position.
/// - `AddTask` and `Delete` are never merged, and nothing is merged across
///   them, so the relative order of structural edits is preserved.
/// - [`drain`](Self::drain) hands the surviving edits to a single
///   `apply_batch` call.
///
/// Because transactions converge (applying the final state once equals
/// applying every intermediate state in turn), dropping superseded edits
/// loses nothing.
#[derive(Debug, Default)]
pub struct EditCoalescer {
    pending: Vec<TaskEdit>,
}

impl EditCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no pending edits.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Record an edit, merging it into a superseded pending edit if one
    /// exists.
    pub fn record(&mut self, edit: TaskEdit) {
        let kind = edit.kind();

        if kind.supersedes_earlier() {
            let superseded = self
                .pending
                .iter()
                .enumerate()
                .rev()
                .take_while(|(_, slot)| slot.kind().supersedes_earlier())
                .find(|(_, slot)| slot.kind() == kind && slot.task_id() == edit.task_id())
                .map(|(index, _)| index);
            if let Some(index) = superseded {
                debug!(task = %edit.task_id(), ?kind, "coalesced pending edit");
                self.pending.remove(index);
            }
        }

        debug!(task = %edit.task_id(), ?kind, pending = self.pending.len() + 1, "queued edit");
        self.pending.push(edit);
    }

    /// Take all pending edits, in order.
    pub fn drain(&mut self) -> Vec<TaskEdit> {
        let edits = std::mem::take(&mut self.pending);
        debug!(drained = edits.len(), "drained pending edits");
        edits
    }
}
