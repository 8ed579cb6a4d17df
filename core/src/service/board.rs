//! The local board: a projection of the latest store snapshot, plus the
//! queue of writes that have been issued but not yet executed.
//!
//! Reorders are applied to the projection immediately. Every other change
//! waits for the store to push it back. Whatever the store pushes next
//! replaces the projection wholesale.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{BoardError, Result};
use crate::gesture::DragEnd;
use crate::model::task::{Category, NewTask, Task, TaskPatch};
use crate::reorder::{move_task, WritePolicy};
use crate::store::{SortKey, Subscription, TaskStore};

/// What to do with the projection when a queued write fails.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log it and keep the optimistic state until the next snapshot.
    #[default]
    Heal,
    /// Log it and immediately reload the authoritative state.
    Resync,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Update { id: Uuid, patch: TaskPatch },
    Delete { id: Uuid },
}

impl WriteOp {
    pub fn id(&self) -> Uuid {
        match self {
            WriteOp::Update { id, .. } | WriteOp::Delete { id } => *id,
        }
    }
}

#[derive(Debug)]
pub struct WriteOutcome {
    pub op: WriteOp,
    pub result: Result<()>,
}

/// Tasks of one category, in board order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub category: Category,
    pub tasks: Vec<Task>,
}

pub struct Board<S: TaskStore> {
    store: S,
    subscription: Subscription,
    tasks: Vec<Task>,
    pending: VecDeque<WriteOp>,
    write_policy: WritePolicy,
    failure_policy: FailurePolicy,
}

impl<S: TaskStore> Board<S> {
    /// Subscribes to the store and loads the first snapshot.
    pub fn new(store: S) -> Result<Self> {
        let subscription = store.subscribe(SortKey::Order)?;
        let mut board = Self {
            store,
            subscription,
            tasks: Vec::new(),
            pending: VecDeque::new(),
            write_policy: WritePolicy::default(),
            failure_policy: FailurePolicy::default(),
        };
        board.sync();
        info!(tasks = board.tasks.len(), "board opened");
        Ok(board)
    }

    pub fn with_policies(mut self, write_policy: WritePolicy, failure_policy: FailurePolicy) -> Self {
        self.write_policy = write_policy;
        self.failure_policy = failure_policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn columns(&self) -> Vec<Column> {
        Category::ALL
            .iter()
            .map(|&category| Column {
                category,
                tasks: self
                    .tasks
                    .iter()
                    .filter(|t| t.category == category)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    pub fn apply_snapshot(&mut self, snapshot: Vec<Task>) {
        self.tasks = snapshot;
    }

    /// Asks the store for outside changes, then applies every snapshot
    /// delivered since the last call, oldest first. Returns how many were
    /// applied.
    pub fn sync(&mut self) -> usize {
        if let Err(e) = self.store.refresh() {
            warn!(error = %e, "store refresh failed");
        }
        let snapshots = self.subscription.drain();
        let count = snapshots.len();
        for snapshot in snapshots {
            self.apply_snapshot(snapshot);
        }
        if count > 0 {
            debug!(snapshots = count, tasks = self.tasks.len(), "board synced");
        }
        count
    }

    /// Creates a task at the end of the board.
    pub fn add_task(&mut self, title: &str, category: Category) -> Result<Uuid> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::Validation("title must not be empty".to_string()));
        }
        let id = self.store.create(NewTask {
            title: title.to_string(),
            category,
            order: self.tasks.len() as i64,
        })?;
        info!(%id, %category, "task added");
        Ok(id)
    }

    pub fn toggle(&mut self, id: Uuid) -> Result<()> {
        let completed = self.task(id).ok_or(BoardError::NotFound(id))?.completed;
        self.dispatch(WriteOp::Update { id, patch: TaskPatch::completed(!completed) });
        Ok(())
    }

    pub fn save_edit(&mut self, id: Uuid, patch: TaskPatch) {
        if patch.is_empty() {
            return;
        }
        self.dispatch(WriteOp::Update { id, patch });
    }

    pub fn delete(&mut self, id: Uuid) {
        self.dispatch(WriteOp::Delete { id });
    }

    /// Applies a finished drag to the board and queues the order writes.
    /// Returns whether anything moved.
    pub fn reorder(&mut self, drag: DragEnd) -> Result<bool> {
        let result = match move_task(&self.tasks, drag.active, drag.over, self.write_policy)? {
            Some(result) => result,
            None => return Ok(false),
        };
        debug!(active = %drag.active, writes = result.writes.len(), "reorder applied");
        self.tasks = result.sequence;
        for write in result.writes {
            self.dispatch(WriteOp::Update { id: write.id, patch: write.patch() });
        }
        Ok(true)
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    fn dispatch(&mut self, op: WriteOp) {
        self.pending.push_back(op);
    }

    /// Runs the queued writes in issue order. Failures are logged, never raised.
    pub fn flush_writes(&mut self) -> Vec<WriteOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while let Some(op) = self.pending.pop_front() {
            let result = match &op {
                WriteOp::Update { id, patch } => self.store.update(*id, patch.clone()),
                WriteOp::Delete { id } => self.store.delete(*id),
            };
            if let Err(e) = &result {
                warn!(id = %op.id(), error = %e, "write failed");
            }
            outcomes.push(WriteOutcome { op, result });
        }

        let failed = outcomes.iter().any(|o| o.result.is_err());
        if failed && self.failure_policy == FailurePolicy::Resync {
            match self.store.snapshot(SortKey::Order) {
                Ok(snapshot) => {
                    info!("reverted to store state after failed write");
                    self.apply_snapshot(snapshot);
                }
                Err(e) => warn!(error = %e, "resync failed"),
            }
        }
        outcomes
    }
}

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;
