mod tui;

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use kanboard_core::{
    init_logging, parse_category, resolve_id, Board, Category, Config, DragEnd, EditDialog,
    FileTaskStore, MemoryTaskStore, TaskStore, WriteOutcome,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Parser)]
#[command(name = "kanboard")]
#[command(about = "A three-column task board", long_about = None)]
struct Cli {
    /// Directory holding tasks.json and the log file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: ~/.kanboard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep tasks in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add a task at the end of the board (usage: add -c progress "Write tests")
    Add {
        /// todo, progress or done (prefixes accepted)
        #[arg(short, long, default_value = "todo")]
        category: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        title: Vec<String>,
    },
    /// List tasks by column
    List,
    /// Flip a task between open and completed
    Toggle { id: String },
    /// Change a task's title and/or category
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a task
    Delete { id: String },
    /// Move a task to the position of another one
    Move { id: String, onto: String },
    /// Open the Terminal User Interface
    Tui,
}

#[derive(Tabled)]
struct BoardRow {
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "St")]
    status: String,
    #[tabled(rename = "Task")]
    title: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    let data_dir = config.data_dir()?;
    init_logging(&config.log_level, &data_dir)?;

    if cli.ephemeral {
        info!("using in-memory store");
        let board = Board::new(MemoryTaskStore::new())?;
        execute(board, cli.command, &config)
    } else {
        let board = Board::new(FileTaskStore::new(Some(data_dir))?)?;
        execute(board, cli.command, &config)
    }
}

fn execute<S: TaskStore>(board: Board<S>, command: Option<Commands>, config: &Config) -> Result<()> {
    let mut board = board.with_policies(config.reorder.write_policy, config.reorder.failure_policy);

    match command {
        Some(Commands::Add { category, title }) => {
            let category = parse_category(&category)?;
            let id = board.add_task(&title.join(" "), category)?;
            board.sync();
            if let Some(task) = board.task(id) {
                println!("Task added: {} (ID: {})", task.title, task.short_id());
                println!("  Column: {}", task.category);
            }
        }
        Some(Commands::List) => print_board(&board),
        Some(Commands::Toggle { id }) => {
            let id = resolve_id(&id, board.tasks())?;
            board.toggle(id)?;
            report(board.flush_writes());
        }
        Some(Commands::Edit { id, title, category }) => {
            if title.is_none() && category.is_none() {
                bail!("Nothing to change: pass --title and/or --category");
            }
            let id = resolve_id(&id, board.tasks())?;
            let mut dialog = EditDialog::default();
            if let Some(task) = board.task(id) {
                dialog.open(task);
            }
            if let Some(title) = title {
                dialog.set_title(title);
            }
            if let Some(category) = category {
                dialog.set_category(parse_category(&category)?);
            }
            if let Some((id, patch)) = dialog.save()? {
                board.save_edit(id, patch);
                report(board.flush_writes());
            }
        }
        Some(Commands::Delete { id }) => {
            let id = resolve_id(&id, board.tasks())?;
            board.delete(id);
            report(board.flush_writes());
        }
        Some(Commands::Move { id, onto }) => {
            let active = resolve_id(&id, board.tasks())?;
            let over = resolve_id(&onto, board.tasks())?;
            if board.reorder(DragEnd { active, over: Some(over) })? {
                report(board.flush_writes());
                board.sync();
                print_board(&board);
            } else {
                println!("Nothing to move.");
            }
        }
        Some(Commands::Tui) | None => {
            info!("starting tui");
            tui::run(board, config.theme, config.drag.constraint())?;
        }
    }
    Ok(())
}

fn print_board<S: TaskStore>(board: &Board<S>) {
    if board.tasks().is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut rows = Vec::new();
    for column in board.columns() {
        for (i, task) in column.tasks.iter().enumerate() {
            rows.push(BoardRow {
                column: if i == 0 { column.category.to_string() } else { String::new() },
                id: task.short_id(),
                status: if task.completed { "✔".to_string() } else { "☐".to_string() },
                title: task.title.clone(),
                created: task.created_at.with_timezone(&Local).format("%Y-%m-%d").to_string(),
            });
        }
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    let counts: Vec<String> = Category::ALL
        .iter()
        .map(|c| format!("{}: {}", c, board.tasks().iter().filter(|t| t.category == *c).count()))
        .collect();
    println!("{}", counts.join(" | "));
}

fn report(outcomes: Vec<WriteOutcome>) {
    let failed: Vec<&WriteOutcome> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    if failed.is_empty() {
        println!("Done.");
        return;
    }
    for outcome in failed {
        if let Err(e) = &outcome.result {
            println!("Warning: {}", e);
        }
    }
}
