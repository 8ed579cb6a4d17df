use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::model::task::Task;
use crate::store::traits::{sort_tasks, SortKey};

struct Subscriber {
    id: u64,
    key: SortKey,
    tx: Sender<Vec<Task>>,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Fan-out of full snapshots to live subscriptions. Stores own one of these
/// and call `publish` after every successful mutation.
#[derive(Default)]
pub struct SnapshotHub {
    state: Arc<Mutex<HubState>>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and hands it `current` as its first snapshot.
    pub fn subscribe(&self, key: SortKey, current: &[Task]) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let mut first = current.to_vec();
        sort_tasks(&mut first, key);
        // The receiver is still in hand, so this cannot fail.
        let _ = tx.send(first);

        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push(Subscriber { id, key, tx });
        debug!(subscription = id, ?key, "subscription opened");

        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.state),
        }
    }

    pub fn publish(&self, tasks: &[Task]) {
        let mut state = self.state.lock();
        state.subscribers.retain(|sub| {
            let mut snapshot = tasks.to_vec();
            sort_tasks(&mut snapshot, sub.key);
            sub.tx.send(snapshot).is_ok()
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

/// A live feed of ordered snapshots. Each snapshot fully replaces the last.
/// Dropping the handle tears the subscription down.
pub struct Subscription {
    id: u64,
    rx: Receiver<Vec<Task>>,
    hub: Weak<Mutex<HubState>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next undelivered snapshot, without blocking.
    pub fn try_next(&self) -> Option<Vec<Task>> {
        match self.rx.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// All pending snapshots in delivery order.
    pub fn drain(&self) -> Vec<Vec<Task>> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.hub.upgrade() {
            state.lock().subscribers.retain(|sub| sub.id != self.id);
            debug!(subscription = self.id, "subscription closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Category, NewTask};
    use uuid::Uuid;

    fn task(title: &str, order: i64) -> Task {
        Task::from_new(
            Uuid::new_v4(),
            NewTask { title: title.to_string(), category: Category::ToDo, order },
        )
    }

    #[test]
    fn test_first_snapshot_is_immediate_and_sorted() {
        let hub = SnapshotHub::new();
        let sub = hub.subscribe(SortKey::Order, &[task("b", 1), task("a", 0)]);
        let first = sub.try_next().unwrap();
        assert_eq!(first[0].title, "a");
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn test_publish_reaches_every_subscriber_in_order() {
        let hub = SnapshotHub::new();
        let one = hub.subscribe(SortKey::Order, &[]);
        let two = hub.subscribe(SortKey::Order, &[]);
        hub.publish(&[task("x", 0)]);
        hub.publish(&[task("x", 0), task("y", 1)]);

        let seen = one.drain();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].len(), 2);
        assert_eq!(two.drain().len(), 3);
    }

    #[test]
    fn test_drop_tears_down() {
        let hub = SnapshotHub::new();
        let sub = hub.subscribe(SortKey::Order, &[]);
        assert_eq!(hub.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(&[task("x", 0)]);
    }
}
