//! Drag-and-drop reordering.
//!
//! A drop moves the dragged task to the index the target occupied and shifts
//! everything between them by one. Order values are then renumbered to match
//! the new indices, so sorting by `order` reproduces the sequence exactly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BoardError, Result};
use crate::model::task::{Task, TaskPatch};

/// Which tasks get an order write after a drop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Rewrite every task's order.
    #[default]
    All,
    /// Only tasks whose index differs from their persisted order.
    Changed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderWrite {
    pub id: Uuid,
    pub order: i64,
}

impl OrderWrite {
    pub fn patch(&self) -> TaskPatch {
        TaskPatch::order(self.order)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reorder {
    /// The post-drop sequence, order values already renumbered.
    pub sequence: Vec<Task>,
    pub writes: Vec<OrderWrite>,
}

/// Computes the result of dropping `active` onto `over`.
///
/// Returns `Ok(None)` when there is nothing to do: no drop target, or the
/// task was dropped onto itself.
pub fn move_task(
    tasks: &[Task],
    active: Uuid,
    over: Option<Uuid>,
    policy: WritePolicy,
) -> Result<Option<Reorder>> {
    let over = match over {
        Some(over) if over != active => over,
        _ => return Ok(None),
    };

    let from = position(tasks, active)?;
    let to = position(tasks, over)?;

    let mut sequence = tasks.to_vec();
    array_move(&mut sequence, from, to);
    let writes = renumber(&mut sequence, policy);

    Ok(Some(Reorder { sequence, writes }))
}

fn position(tasks: &[Task], id: Uuid) -> Result<usize> {
    tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or(BoardError::NotFound(id))
}

/// Removes the item at `from` and reinserts it at `to`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() || to >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Sets each task's order to its index and reports the writes the policy asks for.
pub fn renumber(tasks: &mut [Task], policy: WritePolicy) -> Vec<OrderWrite> {
    let mut writes = Vec::new();
    for (index, task) in tasks.iter_mut().enumerate() {
        let order = index as i64;
        let changed = task.order != order;
        task.order = order;
        if changed || policy == WritePolicy::All {
            writes.push(OrderWrite { id: task.id, order });
        }
    }
    writes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Category, NewTask};

    fn task(title: &str, category: Category, order: i64) -> Task {
        Task::from_new(
            Uuid::new_v4(),
            NewTask { title: title.to_string(), category, order },
        )
    }

    fn board() -> Vec<Task> {
        vec![
            task("A", Category::ToDo, 0),
            task("B", Category::ToDo, 1),
            task("C", Category::InProgress, 2),
        ]
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_drag_a_onto_b() {
        let tasks = board();
        let (a, b, c) = (tasks[0].id, tasks[1].id, tasks[2].id);

        let result = move_task(&tasks, a, Some(b), WritePolicy::All).unwrap().unwrap();

        assert_eq!(titles(&result.sequence), vec!["B", "A", "C"]);
        assert_eq!(
            result.writes,
            vec![
                OrderWrite { id: b, order: 0 },
                OrderWrite { id: a, order: 1 },
                OrderWrite { id: c, order: 2 },
            ]
        );
    }

    #[test]
    fn test_changed_policy_skips_unmoved_tasks() {
        let tasks = board();
        let (a, b) = (tasks[0].id, tasks[1].id);

        let result = move_task(&tasks, a, Some(b), WritePolicy::Changed).unwrap().unwrap();

        assert_eq!(result.writes.len(), 2);
        assert!(result.writes.iter().all(|w| w.id != tasks[2].id));
    }

    #[test]
    fn test_drop_on_self_or_nothing_is_noop() {
        let tasks = board();
        let a = tasks[0].id;
        assert!(move_task(&tasks, a, Some(a), WritePolicy::All).unwrap().is_none());
        assert!(move_task(&tasks, a, None, WritePolicy::All).unwrap().is_none());
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        let tasks = board();
        let ghost = Uuid::new_v4();
        assert!(matches!(
            move_task(&tasks, ghost, Some(tasks[0].id), WritePolicy::All),
            Err(BoardError::NotFound(id)) if id == ghost
        ));
        assert!(matches!(
            move_task(&tasks, tasks[0].id, Some(ghost), WritePolicy::All),
            Err(BoardError::NotFound(_))
        ));
    }

    #[test]
    fn test_every_move_keeps_relative_order_of_others() {
        let names = ["A", "B", "C", "D", "E", "F"];
        let tasks: Vec<Task> = names
            .iter()
            .enumerate()
            .map(|(i, n)| task(n, Category::ToDo, i as i64))
            .collect();

        for from in 0..tasks.len() {
            for to in 0..tasks.len() {
                if from == to {
                    continue;
                }
                let moved = tasks[from].id;
                let result = move_task(&tasks, moved, Some(tasks[to].id), WritePolicy::All)
                    .unwrap()
                    .unwrap();

                assert_eq!(result.sequence[to].id, moved, "moved {} onto {}", from, to);

                let others_before: Vec<Uuid> =
                    tasks.iter().map(|t| t.id).filter(|id| *id != moved).collect();
                let others_after: Vec<Uuid> =
                    result.sequence.iter().map(|t| t.id).filter(|id| *id != moved).collect();
                assert_eq!(others_before, others_after);

                let orders: Vec<i64> = result.sequence.iter().map(|t| t.order).collect();
                assert_eq!(orders, (0..tasks.len() as i64).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_reorder_never_changes_category() {
        let tasks = vec![
            task("A", Category::ToDo, 0),
            task("B", Category::InProgress, 1),
            task("C", Category::ToDo, 2),
            task("D", Category::Done, 3),
        ];
        let result = move_task(&tasks, tasks[2].id, Some(tasks[0].id), WritePolicy::All)
            .unwrap()
            .unwrap();
        for moved in &result.sequence {
            let original = tasks.iter().find(|t| t.id == moved.id).unwrap();
            assert_eq!(moved.category, original.category);
        }
        assert_eq!(titles(&result.sequence), vec!["C", "A", "B", "D"]);
    }

    #[test]
    fn test_renumber_closes_gaps() {
        let mut tasks = vec![
            task("A", Category::ToDo, 0),
            task("C", Category::ToDo, 2),
            task("D", Category::ToDo, 3),
        ];
        let writes = renumber(&mut tasks, WritePolicy::Changed);
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].order, 1);
    }

    #[test]
    fn test_array_move_bounds() {
        let mut items = vec![1, 2, 3];
        array_move(&mut items, 0, 2);
        assert_eq!(items, vec![2, 3, 1]);
        array_move(&mut items, 2, 0);
        assert_eq!(items, vec![1, 2, 3]);
        array_move(&mut items, 5, 0);
        assert_eq!(items, vec![1, 2, 3]);
    }
}
