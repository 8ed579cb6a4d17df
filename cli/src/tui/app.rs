use std::time::Instant;

use kanboard_core::{
    Board, BoardError, Category, Column, DragEnd, EditDialog, KeyboardSensor, Point,
    PointerConstraint, PointerEvent, PointerSensor, Task, TaskStore, Theme,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::{debug, warn};
use uuid::Uuid;

pub enum InputMode {
    Normal,
    Adding,
    Editing,
}

pub struct App<S: TaskStore> {
    pub board: Board<S>,
    pub columns: Vec<Column>,
    pub focus: usize,
    pub states: [ListState; 3],
    pub input: String,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub new_category: Category,
    pub dialog: EditDialog,
    pub pointer: PointerSensor,
    pub keyboard: KeyboardSensor,
    pub theme: Theme,
    pub status: Option<String>,
    /// Inner list areas from the last draw, one per column, for hit testing.
    pub list_areas: [Rect; 3],
}

impl<S: TaskStore> App<S> {
    pub fn new(board: Board<S>, theme: Theme, constraint: PointerConstraint) -> App<S> {
        let mut app = App {
            columns: board.columns(),
            board,
            focus: 0,
            states: Default::default(),
            input: String::new(),
            input_mode: InputMode::Normal,
            cursor_position: 0,
            new_category: Category::ToDo,
            dialog: EditDialog::default(),
            pointer: PointerSensor::new(constraint),
            keyboard: KeyboardSensor::new(),
            theme,
            status: None,
            list_areas: [Rect::default(); 3],
        };
        app.clamp_selection();
        app
    }

    /// One loop iteration: run queued writes, take in snapshots, advance the pointer.
    pub fn tick(&mut self, now: Instant) {
        let outcomes = self.board.flush_writes();
        if outcomes.iter().any(|o| o.result.is_err()) {
            debug!(failed = outcomes.iter().filter(|o| o.result.is_err()).count(), "flush had failures");
        }
        if self.board.sync() > 0 {
            self.refresh();
        }
        if let Some(PointerEvent::DragStart(id)) = self.pointer.tick(now) {
            debug!(%id, "pointer drag started");
        }
    }

    fn refresh(&mut self) {
        let selected = self.selected_task().map(|t| t.id);
        self.columns = self.board.columns();
        match selected {
            Some(id) if self.select_task(id) => {}
            _ => self.clamp_selection(),
        }
    }

    fn clamp_selection(&mut self) {
        for (column, state) in self.columns.iter().zip(self.states.iter_mut()) {
            let len = column.tasks.len();
            match state.selected() {
                _ if len == 0 => state.select(None),
                Some(i) if i >= len => state.select(Some(len - 1)),
                None => state.select(Some(0)),
                _ => {}
            }
        }
    }

    /// Moves focus and selection to `id`. Returns false when it is not on the board.
    pub fn select_task(&mut self, id: Uuid) -> bool {
        for (c, column) in self.columns.iter().enumerate() {
            if let Some(i) = column.tasks.iter().position(|t| t.id == id) {
                self.focus = c;
                self.states[c].select(Some(i));
                return true;
            }
        }
        false
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let column = self.columns.get(self.focus)?;
        let i = self.states[self.focus].selected()?;
        column.tasks.get(i)
    }

    /// The task currently being dragged, by pointer or keyboard.
    pub fn dragging(&self) -> Option<Uuid> {
        self.pointer.active().or_else(|| self.keyboard.active())
    }

    pub fn next(&mut self) {
        let len = self.columns[self.focus].tasks.len();
        if len == 0 {
            return;
        }

        let state = &mut self.states[self.focus];
        let i = match state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.columns[self.focus].tasks.len();
        if len == 0 {
            return;
        }

        let state = &mut self.states[self.focus];
        let i = match state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn focus_right(&mut self) {
        self.focus = (self.focus + 1) % self.columns.len();
    }

    pub fn focus_left(&mut self) {
        self.focus = (self.focus + self.columns.len() - 1) % self.columns.len();
    }

    pub fn toggle_status(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            if let Err(e) = self.board.toggle(id) {
                self.set_error(e);
            }
        }
    }

    pub fn delete_task(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.board.delete(id);
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    fn set_error(&mut self, e: BoardError) {
        warn!(error = %e, "action rejected");
        self.status = Some(e.to_string());
    }

    // Drag and drop

    fn apply_drag(&mut self, drag: DragEnd) {
        match self.board.reorder(drag) {
            Ok(true) => {
                self.columns = self.board.columns();
                self.select_task(drag.active);
            }
            Ok(false) => {}
            Err(e) => self.set_error(e),
        }
    }

    /// Picks up the selected task, or drops the grabbed one onto the selection.
    pub fn grab_or_drop(&mut self) {
        if self.keyboard.active().is_some() {
            let over = self.selected_task().map(|t| t.id);
            if let Some(drag) = self.keyboard.drop_on(over) {
                self.apply_drag(drag);
            }
        } else if let Some(id) = self.selected_task().map(|t| t.id) {
            self.keyboard.grab(id);
        }
    }

    pub fn cancel_grab(&mut self) {
        if let Some(id) = self.keyboard.cancel() {
            self.select_task(id);
        }
    }

    /// Task rendered at terminal cell `(x, y)`, if any.
    pub fn task_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let position = ratatui::layout::Position::new(x, y);
        for (c, area) in self.list_areas.iter().enumerate() {
            if area.contains(position) {
                let row = (y - area.y) as usize + self.states[c].offset();
                if row < self.columns[c].tasks.len() {
                    return Some((c, row));
                }
                return None;
            }
        }
        None
    }

    fn task_id_at(&self, x: u16, y: u16) -> Option<Uuid> {
        self.task_at(x, y).map(|(c, row)| self.columns[c].tasks[row].id)
    }

    pub fn mouse_down(&mut self, x: u16, y: u16, now: Instant) {
        let id = self.task_id_at(x, y);
        self.pointer.press(id, Point::new(x, y), now);
    }

    pub fn mouse_drag(&mut self, x: u16, y: u16, now: Instant) {
        if let Some(event) = self.pointer.motion(Point::new(x, y), now) {
            debug!(?event, "pointer");
        }
        if self.pointer.active().is_some() {
            if let Some((c, row)) = self.task_at(x, y) {
                self.focus = c;
                self.states[c].select(Some(row));
            }
        }
    }

    pub fn mouse_up(&mut self, x: u16, y: u16, now: Instant) {
        let over = self.task_id_at(x, y);
        match self.pointer.release(over, now) {
            Some(PointerEvent::Click(id)) => {
                self.select_task(id);
            }
            Some(PointerEvent::DragEnd(drag)) => self.apply_drag(drag),
            _ => {}
        }
    }

    // Adding

    pub fn enter_add_mode(&mut self) {
        self.input_mode = InputMode::Adding;
        self.input.clear();
        self.cursor_position = 0;
        self.new_category = self.columns[self.focus].category;
        self.status = None;
    }

    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn cycle_new_category(&mut self) {
        self.new_category = self.new_category.next();
    }

    pub fn input_char(&mut self, c: char) {
        let byte_index = self.input.chars().take(self.cursor_position).map(|c| c.len_utf8()).sum();
        self.input.insert(byte_index, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let byte_index: usize = self.input.chars().take(self.cursor_position - 1).map(|c| c.len_utf8()).sum();
            self.input.remove(byte_index);
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn submit_add(&mut self) {
        match self.board.add_task(&self.input, self.new_category) {
            Ok(id) => {
                if self.board.sync() > 0 {
                    self.columns = self.board.columns();
                }
                self.select_task(id);
                self.input.clear();
                self.cursor_position = 0;
                self.exit_input_mode();
            }
            Err(e @ BoardError::Validation(_)) => self.set_error(e),
            Err(e) => {
                self.set_error(e);
                self.exit_input_mode();
            }
        }
    }

    // Editing

    pub fn open_edit(&mut self) {
        if let Some(task) = self.selected_task().cloned() {
            self.dialog.open(&task);
            self.input_mode = InputMode::Editing;
            self.status = None;
        }
    }

    pub fn save_edit(&mut self) {
        match self.dialog.save() {
            Ok(Some((id, patch))) => {
                self.board.save_edit(id, patch);
                self.input_mode = InputMode::Normal;
            }
            Ok(None) => self.input_mode = InputMode::Normal,
            Err(e) => self.set_error(e),
        }
    }

    pub fn cancel_edit(&mut self) {
        self.dialog.cancel();
        self.input_mode = InputMode::Normal;
    }
}
