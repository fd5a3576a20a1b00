use chrono::Local;
use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use plume::cli::{self, Cli, Commands};
use plume::stats::EntryQuery;
use plume::{Config, Database, JournalService, Profile};
use std::path::Path;

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;
    env_logger::Builder::from_env(Env::default().filter_or("PLUME_LOG", "warn")).init();

    let cli = Cli::parse();

    // --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load_with_profile(profile)?,
    };

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?;
    let mut journal = JournalService::new(db);

    let today = Local::now().date_naive();
    let window = |w: Option<_>| w.unwrap_or(config.default_window);

    match cli.command.unwrap_or(Commands::Today { date: None }) {
        Commands::Today { date } => cli::handle_today(date, today, &journal)?,
        Commands::Gratitude { text, date, replace } => {
            cli::handle_gratitude(text, date, replace, today, &mut journal)?
        }
        Commands::Accomplishment { text, date, replace } => {
            cli::handle_accomplishment(text, date, replace, today, &mut journal)?
        }
        Commands::Memory { text, date } => cli::handle_memory(text, date, today, &mut journal)?,
        Commands::Journal { text, date } => cli::handle_journal(text, date, today, &mut journal)?,
        Commands::AddTodo { title, date } => {
            cli::handle_add_todo(title, date, today, &mut journal)?
        }
        Commands::Todos { filter } => cli::handle_todos(filter, today, &journal)?,
        Commands::ToggleTodo { id } => cli::handle_toggle_todo(id, &mut journal)?,
        Commands::MoveTodo { id, to } => cli::handle_move_todo(id, to, today, &mut journal)?,
        Commands::DeleteTodo { id } => cli::handle_delete_todo(id, &mut journal)?,
        Commands::Stats { window: w } => cli::handle_stats(window(w), today, &journal)?,
        Commands::Cloud { max, window: w } => cli::handle_cloud(
            max.unwrap_or(config.word_cloud_max_words),
            window(w),
            today,
            &journal,
        )?,
        Commands::Calendar { year, month } => {
            cli::handle_calendar(year, month, today, &journal)?
        }
        Commands::Heatmap => cli::handle_heatmap(today, &journal)?,
        Commands::Search { query } => cli::handle_search(query, &journal)?,
        Commands::Digest {
            window: w,
            content,
            sort,
        } => {
            let query = EntryQuery {
                window: window(w),
                content,
                sort,
            };
            cli::handle_digest(query, today, &journal)?
        }
        Commands::Export { out } => cli::handle_export(out, &config, &journal)?,
        Commands::Import { path } => cli::handle_import(path, &mut journal)?,
        Commands::DeleteAll { yes } => cli::handle_delete_all(yes, &mut journal)?,
        Commands::Quote => cli::handle_quote(today)?,
    }

    Ok(())
}
