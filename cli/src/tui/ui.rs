use kanboard_core::{TaskStore, Theme};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, InputMode};

struct Palette {
    bg: Color,
    fg: Color,
    accent: Color,
    muted: Color,
    highlight: Color,
    danger: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                bg: Color::Reset,
                fg: Color::White,
                accent: Color::Cyan,
                muted: Color::DarkGray,
                highlight: Color::DarkGray,
                danger: Color::Red,
            },
            Theme::Light => Palette {
                bg: Color::White,
                fg: Color::Black,
                accent: Color::Blue,
                muted: Color::Gray,
                highlight: Color::Gray,
                danger: Color::Red,
            },
        }
    }
}

pub fn draw<S: TaskStore>(f: &mut Frame, app: &mut App<S>) {
    let palette = Palette::for_theme(app.theme);
    let size = f.area();
    f.render_widget(Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)), size);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Columns
            Constraint::Length(3), // Add form
            Constraint::Length(1), // Footer/Help
        ])
        .split(size);

    let theme_label = match app.theme {
        Theme::Dark => "dark",
        Theme::Light => "light",
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled("KANBOARD", Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  ({} theme)", theme_label), Style::default().fg(palette.muted)),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(header, main_chunks[0]);

    draw_columns(f, app, &palette, main_chunks[1]);
    draw_add_form(f, app, &palette, main_chunks[2]);

    let help = match app.input_mode {
        InputMode::Normal if app.keyboard.active().is_some() => {
            "h/j/k/l: choose target | g/Enter: drop | Esc: cancel"
        }
        InputMode::Normal => {
            "hjkl: Navigate | Space: Toggle | e: Edit | d: Delete | a: Add | g: Grab | t: Theme | q: Quit"
        }
        InputMode::Adding => "Enter: Add | Tab: Column | Esc: Cancel",
        InputMode::Editing => "Enter: Save | Tab: Column | Esc: Cancel",
    };
    let footer_text = match &app.status {
        Some(msg) => Line::from(Span::styled(msg.as_str(), Style::default().fg(palette.danger))),
        None => Line::from(help),
    };
    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(palette.muted))
        .alignment(Alignment::Center);
    f.render_widget(footer, main_chunks[3]);

    if app.dialog.is_open() {
        draw_edit_dialog(f, app, &palette, size);
    }
}

fn draw_columns<S: TaskStore>(f: &mut Frame, app: &mut App<S>, palette: &Palette, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let dragging = app.dragging();

    for (c, chunk) in chunks.iter().enumerate() {
        let column = &app.columns[c];
        let focused = c == app.focus;

        let items: Vec<ListItem> = column
            .tasks
            .iter()
            .map(|task| {
                let icon = if task.completed { "✔ " } else { "☐ " };
                let mut style = Style::default().fg(palette.fg);
                if task.completed {
                    style = style.fg(palette.muted).add_modifier(Modifier::CROSSED_OUT);
                }
                if dragging == Some(task.id) {
                    style = style.fg(palette.accent).add_modifier(Modifier::BOLD);
                }
                let marker = if dragging == Some(task.id) { "⇅ " } else { "" };
                ListItem::new(Line::from(vec![
                    Span::raw(marker),
                    Span::raw(icon),
                    Span::styled(task.title.clone(), style),
                ]))
            })
            .collect();

        let border_style = if focused {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.muted)
        };
        let block = Block::default()
            .title(format!(" {} ({}) ", column.category, column.tasks.len()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style);

        app.list_areas[c] = block.inner(*chunk);

        let highlight = if focused {
            Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight)
            .highlight_symbol(if focused { ">> " } else { "   " });

        f.render_stateful_widget(list, *chunk, &mut app.states[c]);
    }
}

fn draw_add_form<S: TaskStore>(f: &mut Frame, app: &App<S>, palette: &Palette, area: Rect) {
    let adding = matches!(app.input_mode, InputMode::Adding);
    let prefix = format!("[{}] ", app.new_category);
    let text = if adding || !app.input.is_empty() {
        Line::from(vec![
            Span::styled(prefix.clone(), Style::default().fg(palette.accent)),
            Span::raw(app.input.as_str()),
        ])
    } else {
        Line::from(Span::styled("Press 'a' to add a task...", Style::default().fg(palette.muted)))
    };

    let border_style = if adding {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.muted)
    };
    let form = Paragraph::new(text).block(
        Block::default()
            .title(" Add a Task ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style),
    );
    f.render_widget(form, area);

    if adding {
        let before: String = app.input.chars().take(app.cursor_position).collect();
        let x = area.x + 1 + prefix.width() as u16 + before.width() as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn draw_edit_dialog<S: TaskStore>(f: &mut Frame, app: &App<S>, palette: &Palette, area: Rect) {
    let draft = match app.dialog.draft() {
        Some(draft) => draft,
        None => return,
    };

    let popup = centered_rect(50, 7, area);
    f.render_widget(Clear, popup);

    let lines = vec![
        Line::from(vec![
            Span::styled("Title:    ", Style::default().fg(palette.accent)),
            Span::styled(draft.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Column:   ", Style::default().fg(palette.accent)),
            Span::raw(format!("◀ {} ▶", draft.category)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: Save | Esc: Cancel",
            Style::default().fg(palette.muted),
        )),
    ];

    let dialog = Paragraph::new(lines)
        .style(Style::default().bg(palette.bg).fg(palette.fg))
        .block(
            Block::default()
                .title(" Edit Task ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(palette.accent)),
        );
    f.render_widget(dialog, popup);

    let x = popup.x + 1 + "Title:    ".width() as u16 + draft.title.width() as u16;
    f.set_cursor_position((x.min(popup.right().saturating_sub(2)), popup.y + 1));
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
