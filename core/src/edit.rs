use uuid::Uuid;

use crate::error::{BoardError, Result};
use crate::model::task::{Category, Task, TaskPatch};

/// Working copy of the task under edit. Nothing here reaches the store until save.
#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditDialog {
    #[default]
    Closed,
    Open(EditDraft),
}

impl EditDialog {
    /// Starts editing `task`. Replaces any draft already open.
    pub fn open(&mut self, task: &Task) {
        *self = EditDialog::Open(EditDraft {
            id: task.id,
            title: task.title.clone(),
            category: task.category,
        });
    }

    pub fn is_open(&self) -> bool {
        matches!(self, EditDialog::Open(_))
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        match self {
            EditDialog::Open(draft) => Some(draft),
            EditDialog::Closed => None,
        }
    }

    fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        match self {
            EditDialog::Open(draft) => Some(draft),
            EditDialog::Closed => None,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(draft) = self.draft_mut() {
            draft.title = title.into();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(draft) = self.draft_mut() {
            draft.title.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(draft) = self.draft_mut() {
            draft.title.pop();
        }
    }

    pub fn set_category(&mut self, category: Category) {
        if let Some(draft) = self.draft_mut() {
            draft.category = category;
        }
    }

    pub fn next_category(&mut self) {
        if let Some(draft) = self.draft_mut() {
            draft.category = draft.category.next();
        }
    }

    pub fn previous_category(&mut self) {
        if let Some(draft) = self.draft_mut() {
            draft.category = draft.category.previous();
        }
    }

    /// Closes the dialog and hands back the patch to persist. A blank title
    /// keeps the dialog open.
    pub fn save(&mut self) -> Result<Option<(Uuid, TaskPatch)>> {
        let draft = match self.draft() {
            Some(draft) => draft,
            None => return Ok(None),
        };
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(BoardError::Validation("title must not be empty".to_string()));
        }
        let saved = (
            draft.id,
            TaskPatch {
                title: Some(title.to_string()),
                category: Some(draft.category),
                ..Default::default()
            },
        );
        *self = EditDialog::Closed;
        Ok(Some(saved))
    }

    pub fn cancel(&mut self) {
        *self = EditDialog::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::NewTask;

    fn task() -> Task {
        Task::from_new(
            Uuid::new_v4(),
            NewTask { title: "Draft spec".to_string(), category: Category::ToDo, order: 0 },
        )
    }

    #[test]
    fn test_save_returns_title_and_category_only() {
        let task = task();
        let mut dialog = EditDialog::default();
        dialog.open(&task);
        dialog.set_title("  Final spec ");
        dialog.next_category();

        let (id, patch) = dialog.save().unwrap().unwrap();
        assert_eq!(id, task.id);
        assert_eq!(patch.title.as_deref(), Some("Final spec"));
        assert_eq!(patch.category, Some(Category::InProgress));
        assert_eq!(patch.completed, None);
        assert_eq!(patch.order, None);
        assert_eq!(dialog, EditDialog::Closed);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let task = task();
        let mut dialog = EditDialog::default();
        dialog.open(&task);
        dialog.push_char('!');
        dialog.cancel();
        assert!(!dialog.is_open());
        assert!(dialog.save().unwrap().is_none());

        dialog.open(&task);
        assert_eq!(dialog.draft().unwrap().title, "Draft spec");
    }

    #[test]
    fn test_blank_title_keeps_dialog_open() {
        let mut dialog = EditDialog::default();
        dialog.open(&task());
        dialog.set_title("   ");
        assert!(matches!(dialog.save(), Err(BoardError::Validation(_))));
        assert!(dialog.is_open());
    }

    #[test]
    fn test_edits_while_closed_are_ignored() {
        let mut dialog = EditDialog::default();
        dialog.push_char('x');
        dialog.set_category(Category::Done);
        assert_eq!(dialog, EditDialog::Closed);
    }

    #[test]
    fn test_opening_another_task_replaces_draft() {
        let (first, second) = (task(), task());
        let mut dialog = EditDialog::default();
        dialog.open(&first);
        dialog.pop_char();
        dialog.open(&second);
        let draft = dialog.draft().unwrap();
        assert_eq!(draft.id, second.id);
        assert_eq!(draft.title, "Draft spec");
    }
}
