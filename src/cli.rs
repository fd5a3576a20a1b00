use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::{self, WEEKDAY_HEADERS, YearMonth};
use crate::config::Config;
use crate::export::{self, ExportError, ImportError};
use crate::journal::{JournalError, JournalService};
use crate::models::{SectionBody, Todo};
use crate::quotes;
use crate::search;
use crate::stats::{self, ContentFilter, DateWindow, EntryQuery, SortOrder, TodoFilter};
use crate::store::EntityStore;
use crate::utils::{expand_path, parse_date};
use crate::word_cloud;

#[derive(Parser)]
#[command(name = "plume")]
#[command(about = "Plume - gratitude, memories, accomplishments and a daily journal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a day's entry, todos, streak and quote (default if no subcommand)
    Today {
        /// Day to show (YYYY-MM-DD, today, yesterday, tomorrow)
        #[arg(long)]
        date: Option<String>,
    },
    /// Add something you are grateful for
    Gratitude {
        text: String,
        #[arg(long)]
        date: Option<String>,
        /// Replace the whole list with the lines of TEXT
        #[arg(long)]
        replace: bool,
    },
    /// Add an accomplishment
    Accomplishment {
        text: String,
        #[arg(long)]
        date: Option<String>,
        /// Replace the whole list with the lines of TEXT
        #[arg(long)]
        replace: bool,
    },
    /// Set the day's memory (empty text clears it)
    Memory {
        text: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Set the day's journal text (empty text clears it)
    Journal {
        text: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Add a todo
    AddTodo {
        title: String,
        /// Day the todo belongs to (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List todos
    Todos {
        #[arg(long, value_enum, default_value_t = TodoFilter::Today)]
        filter: TodoFilter,
    },
    /// Mark a todo done, or open again
    ToggleTodo { id: String },
    /// Move a todo to another day
    MoveTodo {
        id: String,
        /// Target day (YYYY-MM-DD, today, tomorrow)
        to: String,
    },
    /// Delete a todo
    DeleteTodo { id: String },
    /// Streak, word totals and section counts
    Stats {
        #[arg(long, value_enum)]
        window: Option<DateWindow>,
    },
    /// Most frequent words
    Cloud {
        #[arg(long)]
        max: Option<usize>,
        #[arg(long, value_enum)]
        window: Option<DateWindow>,
    },
    /// Month calendar with days that have an entry marked
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Year of writing activity
    Heatmap,
    /// Find text across all entries
    Search { query: String },
    /// Print entries as plain text
    Digest {
        #[arg(long, value_enum)]
        window: Option<DateWindow>,
        #[arg(long, value_enum, default_value_t = ContentFilter::All)]
        content: ContentFilter,
        #[arg(long, value_enum, default_value_t = SortOrder::DateDesc)]
        sort: SortOrder,
    },
    /// Write all entries and todos to a JSON export file
    Export {
        /// Output directory (defaults to the configured export directory)
        #[arg(long)]
        out: Option<String>,
    },
    /// Merge an export file into the journal
    Import { path: String },
    /// Permanently delete every entry and todo
    DeleteAll {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show the quote of the day
    Quote,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    JournalError(#[from] JournalError),
    #[error("{0}")]
    ImportError(#[from] ImportError),
    #[error("{0}")]
    ExportError(#[from] ExportError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Invalid id '{0}'")]
    InvalidId(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(String),
    #[error("Failed to delete data, see the log for details")]
    DeleteFailed,
}

fn resolve_day(date: Option<&str>, today: NaiveDate) -> Result<NaiveDate, CliError> {
    match date {
        Some(raw) => parse_date(raw, today).map_err(CliError::DateParseError),
        None => Ok(today),
    }
}

fn parse_id(raw: &str) -> Result<Uuid, CliError> {
    Uuid::parse_str(raw.trim()).map_err(|_| CliError::InvalidId(raw.to_string()))
}

fn non_empty(text: String) -> Option<String> {
    Some(text).filter(|t| !t.trim().is_empty())
}

fn long_date(day: NaiveDate) -> String {
    day.format("%A, %B %-d, %Y").to_string()
}

/// Handle the today command
pub fn handle_today<S: EntityStore>(
    date: Option<String>,
    today: NaiveDate,
    svc: &JournalService<S>,
) -> Result<(), CliError> {
    let day = resolve_day(date.as_deref(), today)?;
    println!("{}", long_date(day));

    match svc.entry_for(day)? {
        Some(entry) if !entry.sections().is_empty() => {
            for section in entry.sections() {
                println!("\n{}", section.kind.title());
                match section.body {
                    SectionBody::List(items) => {
                        for item in items {
                            println!("  • {}", item);
                        }
                    }
                    SectionBody::Text(text) => println!("  {}", text),
                }
            }
            println!("\n{} words", entry.word_count());
        }
        _ => println!("\nNothing written yet."),
    }

    let todos = svc.todos_for_day(day)?;
    if !todos.is_empty() {
        println!("\nTodos");
        for todo in &todos {
            let mark = if todo.completed { "x" } else { " " };
            println!("  [{}] {}  ({})", mark, todo.title, todo.id);
        }
    }

    println!("\nStreak: {} days", svc.calculate_streak(today)?);
    let quote = quotes::daily_quote(day);
    println!("\n\"{}\" - {}", quote.text, quote.author);
    Ok(())
}

/// Handle the gratitude command
pub fn handle_gratitude<S: EntityStore>(
    text: String,
    date: Option<String>,
    replace: bool,
    today: NaiveDate,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    let day = resolve_day(date.as_deref(), today)?;
    let entry = if replace {
        svc.replace_gratitudes(day, &text)?
    } else {
        svc.add_gratitude(day, &text)?
    };
    svc.save()?;
    println!("{} gratitudes for {}", entry.gratitudes().len(), day);
    Ok(())
}

/// Handle the accomplishment command
pub fn handle_accomplishment<S: EntityStore>(
    text: String,
    date: Option<String>,
    replace: bool,
    today: NaiveDate,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    let day = resolve_day(date.as_deref(), today)?;
    let entry = if replace {
        svc.replace_accomplishments(day, &text)?
    } else {
        svc.add_accomplishment(day, &text)?
    };
    svc.save()?;
    println!("{} accomplishments for {}", entry.accomplishments().len(), day);
    Ok(())
}

/// Handle the memory command
pub fn handle_memory<S: EntityStore>(
    text: String,
    date: Option<String>,
    today: NaiveDate,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    let day = resolve_day(date.as_deref(), today)?;
    let entry = svc.set_memory(day, non_empty(text))?;
    svc.save()?;
    if entry.has_memory() {
        println!("Memory saved for {}", day);
    } else {
        println!("Memory cleared for {}", day);
    }
    Ok(())
}

/// Handle the journal command
pub fn handle_journal<S: EntityStore>(
    text: String,
    date: Option<String>,
    today: NaiveDate,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    let day = resolve_day(date.as_deref(), today)?;
    let entry = svc.set_journal(day, non_empty(text))?;
    svc.save()?;
    println!("Journal saved for {} ({} words)", day, entry.word_count());
    Ok(())
}

/// Handle the add-todo command
pub fn handle_add_todo<S: EntityStore>(
    title: String,
    date: Option<String>,
    today: NaiveDate,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    let day = resolve_day(date.as_deref(), today)?;
    let todo = svc.create_todo(&title, day)?;
    svc.save()?;
    println!("Todo created successfully (ID: {})", todo.id);
    Ok(())
}

/// Overdue block and main list for `filter`. Overdue todos are shown above
/// the day-based views only; `open` already lists them and `completed` never does.
fn todo_listing(todos: &[Todo], filter: TodoFilter, today: NaiveDate) -> (Vec<Todo>, Vec<Todo>) {
    let overdue = match filter {
        TodoFilter::Today | TodoFilter::Upcoming => stats::overdue_todos(todos, today),
        TodoFilter::Open | TodoFilter::Completed => Vec::new(),
    };
    (overdue, stats::filter_todos(todos, filter, today))
}

/// Handle the todos command
pub fn handle_todos<S: EntityStore>(
    filter: TodoFilter,
    today: NaiveDate,
    svc: &JournalService<S>,
) -> Result<(), CliError> {
    let (overdue, todos) = todo_listing(&svc.all_todos()?, filter, today);
    if !overdue.is_empty() {
        println!("Overdue");
        for todo in &overdue {
            println!("  [ ] {}  {}  ({})", todo.date, todo.title, todo.id);
        }
        println!();
    }

    if todos.is_empty() {
        println!("No todos.");
    }
    for todo in &todos {
        let mark = if todo.completed { "x" } else { " " };
        println!("  [{}] {}  {}  ({})", mark, todo.date, todo.title, todo.id);
    }
    Ok(())
}

/// Handle the toggle-todo command
pub fn handle_toggle_todo<S: EntityStore>(
    id: String,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    let todo = svc.toggle_todo(parse_id(&id)?)?;
    svc.save()?;
    let state = if todo.completed { "done" } else { "open" };
    println!("'{}' is now {}", todo.title, state);
    Ok(())
}

/// Handle the move-todo command
pub fn handle_move_todo<S: EntityStore>(
    id: String,
    to: String,
    today: NaiveDate,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    let id = parse_id(&id)?;
    let todo = match to.trim().to_lowercase().as_str() {
        "today" => svc.move_todo_to_today(id, today)?,
        "tomorrow" => svc.move_todo_to_tomorrow(id, today)?,
        _ => svc.move_todo(id, resolve_day(Some(&to), today)?)?,
    };
    svc.save()?;
    println!("Moved '{}' to {}", todo.title, todo.date);
    Ok(())
}

/// Handle the delete-todo command
pub fn handle_delete_todo<S: EntityStore>(
    id: String,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    svc.delete_todo(parse_id(&id)?)?;
    svc.save()?;
    println!("Todo deleted");
    Ok(())
}

/// Handle the stats command
pub fn handle_stats<S: EntityStore>(
    window: DateWindow,
    today: NaiveDate,
    svc: &JournalService<S>,
) -> Result<(), CliError> {
    let entries = stats::entries_in_window(&svc.all_entries()?, window, today);
    let summary = stats::summarize(&entries);

    println!("Current streak:       {} days", svc.calculate_streak(today)?);
    println!("Total words written:  {}", svc.total_word_count()?);
    println!();
    println!("Entries:              {}", summary.total_entries);
    println!("Gratitudes:           {}", summary.total_gratitudes);
    println!("Memories:             {}", summary.memories);
    println!("Accomplishments:      {}", summary.total_accomplishments);
    println!("Avg words / journal:  {}", summary.avg_words_per_journal);
    Ok(())
}

/// Handle the cloud command
pub fn handle_cloud<S: EntityStore>(
    max: usize,
    window: DateWindow,
    today: NaiveDate,
    svc: &JournalService<S>,
) -> Result<(), CliError> {
    let entries = stats::entries_in_window(&svc.all_entries()?, window, today);
    let cloud = word_cloud::word_cloud(&entries, max);
    if cloud.is_empty() {
        println!("Not enough writing for a word cloud yet.");
    }
    for item in cloud {
        let bar = "#".repeat(1 + (item.weight * 19.0).round() as usize);
        println!("{:<20} {:>5}  {}", item.text, item.count, bar);
    }
    Ok(())
}

/// Handle the calendar command
pub fn handle_calendar<S: EntityStore>(
    year: Option<i32>,
    month: Option<u32>,
    today: NaiveDate,
    svc: &JournalService<S>,
) -> Result<(), CliError> {
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());
    let ym = YearMonth::new(year, month)
        .ok_or_else(|| CliError::InvalidMonth(format!("{}-{}", year, month)))?;

    let written: Vec<NaiveDate> = svc
        .all_entries()?
        .iter()
        .filter(|e| YearMonth::containing(e.date) == ym)
        .map(|e| e.date)
        .collect();

    println!("{}", ym);
    println!("{}", WEEKDAY_HEADERS.map(|h| format!("{:>4}", h)).join(""));
    for row in calendar::weeks(&calendar::month_grid(ym)) {
        let line: String = row
            .iter()
            .map(|cell| match cell {
                Some(day) => {
                    let mark = if written.contains(day) { '*' } else { ' ' };
                    format!("{:>3}{}", day.day(), mark)
                }
                None => "    ".to_string(),
            })
            .collect();
        println!("{}", line.trim_end());
    }
    Ok(())
}

/// Handle the heatmap command
pub fn handle_heatmap<S: EntityStore>(
    today: NaiveDate,
    svc: &JournalService<S>,
) -> Result<(), CliError> {
    const SHADES: [char; 5] = ['·', '░', '▒', '▓', '█'];
    let cells = calendar::heatmap(&svc.all_entries()?, today);

    for (weekday, header) in WEEKDAY_HEADERS.iter().enumerate() {
        let row: String = cells
            .iter()
            .skip(weekday)
            .step_by(7)
            .map(|cell| {
                if cell.date > today {
                    ' '
                } else {
                    SHADES[usize::from(cell.level)]
                }
            })
            .collect();
        println!("{} {}", header, row);
    }
    Ok(())
}

/// Handle the search command
pub fn handle_search<S: EntityStore>(
    query: String,
    svc: &JournalService<S>,
) -> Result<(), CliError> {
    let hits = search::search(&svc.all_entries()?, &query);
    if hits.is_empty() {
        println!("No matches for '{}'", query);
    }
    for hit in hits {
        println!("{}  {:<16} {}", hit.date, hit.kind.title(), hit.preview);
    }
    Ok(())
}

/// Handle the digest command
pub fn handle_digest<S: EntityStore>(
    query: EntryQuery,
    today: NaiveDate,
    svc: &JournalService<S>,
) -> Result<(), CliError> {
    let entries = query.apply(&svc.all_entries()?, today);
    print!("{}", export::plain_text_digest(&entries));
    Ok(())
}

/// Handle the export command
pub fn handle_export<S: EntityStore>(
    out: Option<String>,
    config: &Config,
    svc: &JournalService<S>,
) -> Result<(), CliError> {
    let dir: PathBuf = match out {
        Some(out) => expand_path(&out),
        None => config.get_export_dir(),
    };
    let entries = svc.all_entries()?;
    let todos = svc.all_todos()?;
    let path = export::write_export(&dir, &entries, &todos, Utc::now())?;
    println!(
        "Exported {} entries and {} todos to {}",
        entries.len(),
        todos.len(),
        path.display()
    );
    Ok(())
}

/// Handle the import command
pub fn handle_import<S: EntityStore>(
    path: String,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    let path = expand_path(&path);
    let summary = export::import_file(&path, svc.store_mut())?;
    println!(
        "Imported entries: {} new, {} updated. Todos: {} new, {} updated, {} skipped.",
        summary.entries_inserted,
        summary.entries_updated,
        summary.todos_inserted,
        summary.todos_updated,
        summary.todos_skipped
    );
    Ok(())
}

/// Handle the delete-all command
pub fn handle_delete_all<S: EntityStore>(
    yes: bool,
    svc: &mut JournalService<S>,
) -> Result<(), CliError> {
    if !yes {
        println!("This deletes every entry and todo. Run again with --yes to confirm.");
        return Ok(());
    }
    if !svc.delete_all_data() {
        return Err(CliError::DeleteFailed);
    }
    println!("All data deleted");
    Ok(())
}

/// Handle the quote command
pub fn handle_quote(today: NaiveDate) -> Result<(), CliError> {
    let quote = quotes::daily_quote(today);
    println!("\"{}\"\n  - {}", quote.text, quote.author);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::test_support::UnsaveableStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 10).unwrap()
    }

    #[test]
    fn test_cli_parses_default_and_subcommands() {
        let cli = Cli::try_parse_from(["plume"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["plume", "--dev", "stats", "--window", "month"]).unwrap();
        assert!(cli.dev);
        assert!(matches!(
            cli.command,
            Some(Commands::Stats {
                window: Some(DateWindow::LastMonth)
            })
        ));

        let cli = Cli::try_parse_from(["plume", "todos", "--filter", "upcoming"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Todos {
                filter: TodoFilter::Upcoming
            })
        ));

        assert!(Cli::try_parse_from(["plume", "cloud", "--window", "decade"]).is_err());
    }

    #[test]
    fn test_handlers_save_after_mutation() {
        let mut svc = JournalService::new(MemoryStore::new());

        handle_gratitude("rain on the roof".to_string(), None, false, today(), &mut svc).unwrap();
        handle_journal(
            "Slow afternoon with a book".to_string(),
            Some("yesterday".to_string()),
            today(),
            &mut svc,
        )
        .unwrap();
        handle_add_todo("water plants".to_string(), None, today(), &mut svc).unwrap();
        assert!(!svc.has_unsaved_changes());

        let yesterday = today().pred_opt().unwrap();
        let entry = svc.entry_for(yesterday).unwrap().unwrap();
        assert_eq!(entry.word_count(), 5);
        assert_eq!(svc.calculate_streak(today()).unwrap(), 2);

        let id = svc.all_todos().unwrap()[0].id.to_string();
        handle_move_todo(id.clone(), "tomorrow".to_string(), today(), &mut svc).unwrap();
        assert_eq!(svc.all_todos().unwrap()[0].date, today().succ_opt().unwrap());
        handle_toggle_todo(id, &mut svc).unwrap();
        assert!(svc.all_todos().unwrap()[0].completed);
    }

    #[test]
    fn test_memory_with_blank_text_clears() {
        let mut svc = JournalService::new(MemoryStore::new());
        handle_memory("first snow".to_string(), None, today(), &mut svc).unwrap();
        handle_memory("  ".to_string(), None, today(), &mut svc).unwrap();
        assert_eq!(svc.entry_for(today()).unwrap().unwrap().memory(), None);
    }

    #[test]
    fn test_bad_arguments_are_reported() {
        let mut svc = JournalService::new(MemoryStore::new());
        assert!(matches!(
            handle_toggle_todo("42".to_string(), &mut svc),
            Err(CliError::InvalidId(_))
        ));
        assert!(matches!(
            handle_add_todo("x".to_string(), Some("someday".to_string()), today(), &mut svc),
            Err(CliError::DateParseError(_))
        ));
        assert!(matches!(
            handle_calendar(Some(2024), Some(13), today(), &svc),
            Err(CliError::InvalidMonth(_))
        ));
    }

    #[test]
    fn test_delete_all_requires_confirmation() {
        let mut svc = JournalService::new(MemoryStore::new());
        handle_add_todo("keep me".to_string(), None, today(), &mut svc).unwrap();

        handle_delete_all(false, &mut svc).unwrap();
        assert_eq!(svc.all_todos().unwrap().len(), 1);

        handle_delete_all(true, &mut svc).unwrap();
        assert!(svc.all_todos().unwrap().is_empty());
    }

    #[test]
    fn test_delete_all_failure_is_reported() {
        let mut svc = JournalService::new(UnsaveableStore(MemoryStore::new()));
        svc.create_todo("keep me", today()).unwrap();
        assert!(matches!(
            handle_delete_all(true, &mut svc),
            Err(CliError::DeleteFailed)
        ));
    }

    #[test]
    fn test_overdue_todos_listed_once() {
        let last_week = NaiveDate::from_ymd_opt(2024, 7, 3).unwrap();
        let todos = vec![
            Todo::new("file taxes", last_week).unwrap(),
            Todo::new("buy milk", today()).unwrap(),
        ];

        for filter in [TodoFilter::Open, TodoFilter::Today, TodoFilter::Upcoming] {
            let (overdue, listed) = todo_listing(&todos, filter, today());
            let mentions = overdue
                .iter()
                .chain(&listed)
                .filter(|t| t.title == "file taxes")
                .count();
            assert_eq!(mentions, 1, "{filter:?}");
        }

        let (overdue, listed) = todo_listing(&todos, TodoFilter::Completed, today());
        assert!(overdue.is_empty());
        assert!(listed.is_empty());
    }
}
