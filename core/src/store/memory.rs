use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{BoardError, Result};
use crate::model::task::{NewTask, Task, TaskPatch};
use crate::store::hub::{SnapshotHub, Subscription};
use crate::store::traits::{sort_tasks, SortKey, TaskStore};

#[derive(Default)]
struct MemoryState {
    tasks: Vec<Task>,
    writes: usize,
    // Each entry fails one upcoming write; `Some(id)` only matches writes to that task.
    failures: VecDeque<Option<Uuid>>,
    offline: bool,
    unreachable: HashSet<Uuid>,
}

/// Process-local store. Also lets callers inject write failures, which is how
/// the divergence between optimistic and persisted state is exercised.
#[derive(Default)]
pub struct MemoryTaskStore {
    state: Mutex<MemoryState>,
    hub: SnapshotHub,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing records, ids and order values kept as given.
    pub fn seeded(tasks: Vec<Task>) -> Self {
        let store = Self::default();
        store.state.lock().tasks = tasks;
        store
    }

    /// Number of create/update/delete calls received, failed ones included.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    /// Fails the next `n` writes regardless of target.
    pub fn fail_next_writes(&self, n: usize) {
        let mut state = self.state.lock();
        state.failures.extend(std::iter::repeat(None).take(n));
    }

    /// Fails every write to `id` until cleared with `set_offline(false)`.
    pub fn fail_writes_for(&self, id: Uuid) {
        self.state.lock().unreachable.insert(id);
    }

    pub fn set_offline(&self, offline: bool) {
        let mut state = self.state.lock();
        state.offline = offline;
        if !offline {
            state.unreachable.clear();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn check_write(state: &mut MemoryState, target: Option<Uuid>) -> Result<()> {
        state.writes += 1;
        if state.offline {
            return Err(BoardError::TransientWrite("store is offline".to_string()));
        }
        if let Some(id) = target {
            if state.unreachable.contains(&id) {
                return Err(BoardError::TransientWrite(format!("write to {} dropped", id)));
            }
        }
        if let Some(pos) = state.failures.iter().position(|f| f.is_none() || *f == target) {
            state.failures.remove(pos);
            return Err(BoardError::TransientWrite("injected failure".to_string()));
        }
        Ok(())
    }
}

impl TaskStore for MemoryTaskStore {
    fn subscribe(&self, key: SortKey) -> Result<Subscription> {
        let state = self.state.lock();
        Ok(self.hub.subscribe(key, &state.tasks))
    }

    fn create(&self, task: NewTask) -> Result<Uuid> {
        let mut state = self.state.lock();
        Self::check_write(&mut state, None)?;
        let id = Uuid::new_v4();
        state.tasks.push(Task::from_new(id, task));
        debug!(%id, "memory store: created");
        self.hub.publish(&state.tasks);
        Ok(id)
    }

    fn update(&self, id: Uuid, patch: TaskPatch) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_write(&mut state, Some(id))?;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(BoardError::NotFound(id))?;
        task.apply(&patch);
        self.hub.publish(&state.tasks);
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_write(&mut state, Some(id))?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() != before {
            self.hub.publish(&state.tasks);
        }
        Ok(())
    }

    fn snapshot(&self, key: SortKey) -> Result<Vec<Task>> {
        let mut tasks = self.state.lock().tasks.clone();
        sort_tasks(&mut tasks, key);
        Ok(tasks)
    }
}
