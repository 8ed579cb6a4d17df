pub mod app;
pub mod ui;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use kanboard_core::{Board, PointerConstraint, TaskStore, Theme};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{error, info};

use crate::tui::app::{App, InputMode};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn run<S: TaskStore>(board: Board<S>, theme: Theme, constraint: PointerConstraint) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(board, theme, constraint);
    let res = run_app(&mut terminal, &mut app);

    // Pending writes still go out on quit.
    app.board.flush_writes();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "tui exited with error");
        println!("{:?}", err);
    }
    info!("tui closed");

    Ok(())
}

fn run_app<B: Backend, S: TaskStore>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()> {
    loop {
        app.tick(Instant::now());

        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(|e| io::Error::other(e.to_string()))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !handle_key(app, key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }
    }
}

/// Returns false when the user asked to quit.
fn handle_key<S: TaskStore>(app: &mut App<S>, key: KeyEvent) -> bool {
    match app.input_mode {
        InputMode::Normal => {
            app.status = None;
            let grabbing = app.keyboard.active().is_some();
            match key.code {
                KeyCode::Char('q') => return false,
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Right | KeyCode::Char('l') => app.focus_right(),
                KeyCode::Left | KeyCode::Char('h') => app.focus_left(),
                KeyCode::Char('g') => app.grab_or_drop(),
                KeyCode::Enter if grabbing => app.grab_or_drop(),
                KeyCode::Esc if grabbing => app.cancel_grab(),
                _ if grabbing => {}
                KeyCode::Char(' ') => app.toggle_status(),
                KeyCode::Char('e') | KeyCode::Enter => app.open_edit(),
                KeyCode::Char('d') | KeyCode::Delete => app.delete_task(),
                KeyCode::Char('a') => app.enter_add_mode(),
                KeyCode::Char('t') => app.toggle_theme(),
                _ => {}
            }
        }
        InputMode::Adding => match key.code {
            KeyCode::Enter => app.submit_add(),
            KeyCode::Esc => app.exit_input_mode(),
            KeyCode::Tab => app.cycle_new_category(),
            KeyCode::Char(c) => app.input_char(c),
            KeyCode::Backspace => app.delete_char(),
            KeyCode::Left => app.move_cursor_left(),
            KeyCode::Right => app.move_cursor_right(),
            _ => {}
        },
        InputMode::Editing => match key.code {
            KeyCode::Enter => app.save_edit(),
            KeyCode::Esc => app.cancel_edit(),
            KeyCode::Tab => app.dialog.next_category(),
            KeyCode::BackTab => app.dialog.previous_category(),
            KeyCode::Char(c) => app.dialog.push_char(c),
            KeyCode::Backspace => app.dialog.pop_char(),
            _ => {}
        },
    }
    true
}

fn handle_mouse<S: TaskStore>(app: &mut App<S>, mouse: MouseEvent) {
    if !matches!(app.input_mode, InputMode::Normal) {
        return;
    }
    let now = Instant::now();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row, now),
        MouseEventKind::Drag(MouseButton::Left) => app.mouse_drag(mouse.column, mouse.row, now),
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(mouse.column, mouse.row, now),
        _ => {}
    }
}
