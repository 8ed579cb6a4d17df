use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::model::task::{NewTask, Task, TaskPatch};
use crate::store::hub::Subscription;

/// Field a subscription orders its snapshots by.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Order,
    CreatedAt,
}

/// The persistence collaborator. Every successful mutation is followed by a
/// full snapshot pushed to each live subscription.
pub trait TaskStore {
    /// Opens a live subscription. The current snapshot is delivered immediately.
    fn subscribe(&self, key: SortKey) -> Result<Subscription>;

    fn create(&self, task: NewTask) -> Result<Uuid>;

    /// Fails with `NotFound` when the id is gone. Never upserts.
    fn update(&self, id: Uuid, patch: TaskPatch) -> Result<()>;

    /// Deleting an absent id succeeds.
    fn delete(&self, id: Uuid) -> Result<()>;

    /// One-shot read of the authoritative state.
    fn snapshot(&self, key: SortKey) -> Result<Vec<Task>>;

    /// Picks up changes this handle did not make itself and publishes them.
    /// Returns whether a snapshot went out.
    fn refresh(&self) -> Result<bool> {
        Ok(false)
    }
}

impl<S: TaskStore + ?Sized> TaskStore for Arc<S> {
    fn subscribe(&self, key: SortKey) -> Result<Subscription> {
        (**self).subscribe(key)
    }

    fn create(&self, task: NewTask) -> Result<Uuid> {
        (**self).create(task)
    }

    fn update(&self, id: Uuid, patch: TaskPatch) -> Result<()> {
        (**self).update(id, patch)
    }

    fn delete(&self, id: Uuid) -> Result<()> {
        (**self).delete(id)
    }

    fn snapshot(&self, key: SortKey) -> Result<Vec<Task>> {
        (**self).snapshot(key)
    }

    fn refresh(&self) -> Result<bool> {
        (**self).refresh()
    }
}

impl<S: TaskStore + ?Sized> TaskStore for &S {
    fn subscribe(&self, key: SortKey) -> Result<Subscription> {
        (**self).subscribe(key)
    }

    fn create(&self, task: NewTask) -> Result<Uuid> {
        (**self).create(task)
    }

    fn update(&self, id: Uuid, patch: TaskPatch) -> Result<()> {
        (**self).update(id, patch)
    }

    fn delete(&self, id: Uuid) -> Result<()> {
        (**self).delete(id)
    }

    fn snapshot(&self, key: SortKey) -> Result<Vec<Task>> {
        (**self).snapshot(key)
    }

    fn refresh(&self) -> Result<bool> {
        (**self).refresh()
    }
}

/// Sorts by the key, breaking ties by creation time and then id so the
/// result is a total order even when two tasks share an order value.
pub fn sort_tasks(tasks: &mut [Task], key: SortKey) {
    tasks.sort_by(|a, b| compare(a, b, key));
}

fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Order => a.order.cmp(&b.order),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    };
    primary
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Category;
    use chrono::{Duration, Utc};

    fn task(title: &str, order: i64, age_secs: i64) -> Task {
        let mut t = Task::from_new(
            Uuid::new_v4(),
            NewTask { title: title.to_string(), category: Category::ToDo, order },
        );
        t.created_at = Utc::now() - Duration::seconds(age_secs);
        t
    }

    #[test]
    fn test_sort_by_order_breaks_ties_by_age() {
        let mut tasks = vec![task("young", 1, 0), task("first", 0, 5), task("old", 1, 60)];
        sort_tasks(&mut tasks, SortKey::Order);
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "old", "young"]);
    }

    #[test]
    fn test_sort_by_created_at() {
        let mut tasks = vec![task("new", 0, 1), task("old", 5, 100)];
        sort_tasks(&mut tasks, SortKey::CreatedAt);
        assert_eq!(tasks[0].title, "old");
    }
}
