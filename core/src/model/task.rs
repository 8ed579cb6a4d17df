use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow stage a task sits in. The board always shows all three, in this order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::ToDo, Category::InProgress, Category::Done];

    pub fn label(&self) -> &'static str {
        match self {
            Category::ToDo => "To Do",
            Category::InProgress => "In Progress",
            Category::Done => "Done",
        }
    }

    /// Position of the column on the board.
    pub fn index(&self) -> usize {
        match self {
            Category::ToDo => 0,
            Category::InProgress => 1,
            Category::Done => 2,
        }
    }

    pub fn next(&self) -> Self {
        Category::ALL[(self.index() + 1) % Category::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        Category::ALL[(self.index() + Category::ALL.len() - 1) % Category::ALL.len()]
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::ToDo
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub category: Category,
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Materializes a stored record. Only stores assign ids.
    pub fn from_new(id: Uuid, fields: NewTask) -> Self {
        Self {
            id,
            title: fields.title,
            completed: false,
            category: fields.category,
            order: fields.order,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
    }

    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

/// Fields supplied by the user when creating a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub category: Category,
    pub order: i64,
}

/// Partial update. `None` leaves the field untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub category: Option<Category>,
    pub order: Option<i64>,
}

impl TaskPatch {
    pub fn order(order: i64) -> Self {
        Self { order: Some(order), ..Default::default() }
    }

    pub fn completed(completed: bool) -> Self {
        Self { completed: Some(completed), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.completed.is_none()
            && self.category.is_none()
            && self.order.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_as_display_label() {
        let json = serde_json::to_string(&Category::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let back: Category = serde_json::from_str("\"To Do\"").unwrap();
        assert_eq!(back, Category::ToDo);
        assert!(serde_json::from_str::<Category>("\"Blocked\"").is_err());
    }

    #[test]
    fn test_category_cycles() {
        assert_eq!(Category::ToDo.next(), Category::InProgress);
        assert_eq!(Category::Done.next(), Category::ToDo);
        assert_eq!(Category::ToDo.previous(), Category::Done);
    }

    #[test]
    fn test_task_record_shape() {
        let task = Task::from_new(
            Uuid::new_v4(),
            NewTask { title: "Write docs".to_string(), category: Category::Done, order: 3 },
        );
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["title"], "Write docs");
        assert_eq!(value["completed"], false);
        assert_eq!(value["category"], "Done");
        assert_eq!(value["order"], 3);
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_apply_patch_only_touches_set_fields() {
        let mut task = Task::from_new(
            Uuid::new_v4(),
            NewTask { title: "a".to_string(), category: Category::ToDo, order: 0 },
        );
        task.apply(&TaskPatch { category: Some(Category::Done), ..Default::default() });
        assert_eq!(task.title, "a");
        assert_eq!(task.category, Category::Done);
        assert!(!task.completed);
        assert!(TaskPatch::default().is_empty());
    }
}
