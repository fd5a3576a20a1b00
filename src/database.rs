use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info, warn};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::{Entry, EntryParts, Todo};
use crate::store::{EntityStore, PersistenceError};

const DATE_FORMAT: &str = "%Y-%m-%d";

const ENTRY_COLUMNS: &str = "id, date, gratitudes, memory, accomplishments, journal, created_at, updated_at";
const TODO_COLUMNS: &str = "id, date, title, completed, created_at, updated_at";

/// SQLite-backed entity store.
///
/// The first mutation opens a transaction and `save()` commits it, so writes
/// are visible to reads on this connection right away but only become durable
/// on save. Dropping the database with unsaved changes rolls them back.
pub struct Database {
    conn: Connection,
    in_batch: bool,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, PersistenceError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PersistenceError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        info!("opened journal database at {}", db_path.display());

        let db = Database { conn, in_batch: false };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open a throwaway database that lives only as long as this value
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
            in_batch: false,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), PersistenceError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                id              TEXT PRIMARY KEY,
                date            TEXT NOT NULL,
                gratitudes      TEXT NOT NULL DEFAULT '[]',
                memory          TEXT,
                accomplishments TEXT NOT NULL DEFAULT '[]',
                journal         TEXT,
                word_count      INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS todos (
                id              TEXT PRIMARY KEY,
                date            TEXT NOT NULL,
                title           TEXT NOT NULL,
                completed       INTEGER DEFAULT 0,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_todos_date ON todos(date)",
            [],
        )?;

        Ok(())
    }

    fn begin_batch(&mut self) -> Result<(), PersistenceError> {
        if !self.in_batch {
            self.conn.execute_batch("BEGIN")?;
            self.in_batch = true;
        }
        Ok(())
    }

    /// Run a write inside the open batch, starting one first if needed.
    fn staged<T>(
        &mut self,
        write: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, PersistenceError> {
        self.begin_batch()?;
        let result = write(&self.conn);
        result.map_err(|err| self.batch_error(err))
    }

    /// Map a failed write or commit. On a full disk or an I/O error SQLite
    /// rolls the whole transaction back on its own; the staged writes are gone
    /// and the next write must open a fresh batch.
    fn batch_error(&mut self, err: rusqlite::Error) -> PersistenceError {
        if self.in_batch && self.conn.is_autocommit() {
            self.in_batch = false;
            error!("unsaved journal changes were discarded: {err}");
            PersistenceError::BatchDiscarded(err.to_string())
        } else {
            err.into()
        }
    }

    /// Helper function to map a row to an Entry
    fn row_to_entry(row: &Row) -> Result<Entry, rusqlite::Error> {
        Ok(Entry::from_parts(EntryParts {
            id: parse_column(row, 0, Uuid::parse_str)?,
            date: parse_column(row, 1, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))?,
            gratitudes: parse_column(row, 2, |s| serde_json::from_str::<Vec<String>>(s))?,
            memory: row.get(3)?,
            accomplishments: parse_column(row, 4, |s| serde_json::from_str::<Vec<String>>(s))?,
            journal: row.get(5)?,
            created_at: parse_column(row, 6, parse_timestamp)?,
            updated_at: parse_column(row, 7, parse_timestamp)?,
        }))
    }

    /// Helper function to map a row to a Todo
    fn row_to_todo(row: &Row) -> Result<Todo, rusqlite::Error> {
        Ok(Todo {
            id: parse_column(row, 0, Uuid::parse_str)?,
            date: parse_column(row, 1, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))?,
            title: row.get(2)?,
            completed: row.get::<_, i64>(3)? != 0,
            created_at: parse_column(row, 4, parse_timestamp)?,
            updated_at: parse_column(row, 5, parse_timestamp)?,
        })
    }

    fn list_json(items: &[String]) -> Result<String, PersistenceError> {
        serde_json::to_string(items).map_err(|e| PersistenceError::CorruptRow(e.to_string()))
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Read a TEXT column and convert it, reporting failures against the column index.
fn parse_column<T, E>(
    row: &Row,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, rusqlite::Error>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl EntityStore for Database {
    fn find_entry_by_day(&self, day: NaiveDate) -> Result<Option<Entry>, PersistenceError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE date = ?1 ORDER BY created_at ASC LIMIT 1"
        ))?;
        let entry = stmt
            .query_row(rusqlite::params![day.format(DATE_FORMAT).to_string()], Self::row_to_entry)
            .optional()?;
        Ok(entry)
    }

    fn find_entry(&self, id: Uuid) -> Result<Option<Entry>, PersistenceError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"))?;
        let entry = stmt
            .query_row(rusqlite::params![id.to_string()], Self::row_to_entry)
            .optional()?;
        Ok(entry)
    }

    fn find_todo(&self, id: Uuid) -> Result<Option<Todo>, PersistenceError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"))?;
        let todo = stmt
            .query_row(rusqlite::params![id.to_string()], Self::row_to_todo)
            .optional()?;
        Ok(todo)
    }

    fn all_entries(&self) -> Result<Vec<Entry>, PersistenceError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY date ASC, created_at ASC"
        ))?;
        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn all_todos(&self) -> Result<Vec<Todo>, PersistenceError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TODO_COLUMNS} FROM todos ORDER BY date ASC, created_at ASC"
        ))?;
        let todos = stmt
            .query_map([], Self::row_to_todo)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    fn insert_entry(&mut self, entry: &Entry) -> Result<(), PersistenceError> {
        let gratitudes = Self::list_json(entry.gratitudes())?;
        let accomplishments = Self::list_json(entry.accomplishments())?;
        self.staged(|conn| {
            conn.execute(
                "INSERT INTO entries (id, date, gratitudes, memory, accomplishments, journal, word_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    entry.id.to_string(),
                    entry.date.format(DATE_FORMAT).to_string(),
                    gratitudes,
                    entry.memory(),
                    accomplishments,
                    entry.journal(),
                    entry.word_count(),
                    entry.created_at.to_rfc3339(),
                    entry.updated_at.to_rfc3339()
                ],
            )
        })?;
        Ok(())
    }

    fn update_entry(&mut self, entry: &Entry) -> Result<(), PersistenceError> {
        let gratitudes = Self::list_json(entry.gratitudes())?;
        let accomplishments = Self::list_json(entry.accomplishments())?;
        self.staged(|conn| {
            conn.execute(
                "UPDATE entries SET date = ?1, gratitudes = ?2, memory = ?3, accomplishments = ?4,
                 journal = ?5, word_count = ?6, updated_at = ?7 WHERE id = ?8",
                rusqlite::params![
                    entry.date.format(DATE_FORMAT).to_string(),
                    gratitudes,
                    entry.memory(),
                    accomplishments,
                    entry.journal(),
                    entry.word_count(),
                    entry.updated_at.to_rfc3339(),
                    entry.id.to_string()
                ],
            )
        })?;
        Ok(())
    }

    fn delete_entry(&mut self, id: Uuid) -> Result<(), PersistenceError> {
        self.staged(|conn| {
            conn.execute(
                "DELETE FROM entries WHERE id = ?1",
                rusqlite::params![id.to_string()],
            )
        })?;
        Ok(())
    }

    fn insert_todo(&mut self, todo: &Todo) -> Result<(), PersistenceError> {
        self.staged(|conn| {
            conn.execute(
                "INSERT INTO todos (id, date, title, completed, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    todo.id.to_string(),
                    todo.date.format(DATE_FORMAT).to_string(),
                    todo.title,
                    if todo.completed { 1 } else { 0 },
                    todo.created_at.to_rfc3339(),
                    todo.updated_at.to_rfc3339()
                ],
            )
        })?;
        Ok(())
    }

    fn update_todo(&mut self, todo: &Todo) -> Result<(), PersistenceError> {
        self.staged(|conn| {
            conn.execute(
                "UPDATE todos SET date = ?1, title = ?2, completed = ?3, updated_at = ?4 WHERE id = ?5",
                rusqlite::params![
                    todo.date.format(DATE_FORMAT).to_string(),
                    todo.title,
                    if todo.completed { 1 } else { 0 },
                    todo.updated_at.to_rfc3339(),
                    todo.id.to_string()
                ],
            )
        })?;
        Ok(())
    }

    fn delete_todo(&mut self, id: Uuid) -> Result<(), PersistenceError> {
        self.staged(|conn| {
            conn.execute(
                "DELETE FROM todos WHERE id = ?1",
                rusqlite::params![id.to_string()],
            )
        })?;
        Ok(())
    }

    fn delete_all(&mut self) -> Result<(), PersistenceError> {
        self.staged(|conn| conn.execute_batch("DELETE FROM entries; DELETE FROM todos;"))
    }

    fn save(&mut self) -> Result<(), PersistenceError> {
        if self.in_batch {
            // Unless SQLite dropped the transaction itself, a failed commit
            // leaves it open and save() can be retried.
            if let Err(err) = self.conn.execute_batch("COMMIT") {
                return Err(self.batch_error(err));
            }
            self.in_batch = false;
        }
        Ok(())
    }

    fn has_unsaved_changes(&self) -> bool {
        self.in_batch
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if self.in_batch {
            warn!("discarding unsaved journal changes");
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                error!("Failed to roll back unsaved changes: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_entry_round_trips_through_sqlite() {
        let mut db = Database::open_in_memory().unwrap();
        let mut entry = Entry::new(day(2024, 7, 4));
        entry.add_gratitude("fireworks").unwrap();
        entry.add_accomplishment("grilled for twelve").unwrap();
        entry.set_memory(Some("sparklers at dusk".to_string()));
        entry.set_journal(Some("hot and loud and lovely".to_string()));
        db.insert_entry(&entry).unwrap();

        let loaded = db.find_entry_by_day(day(2024, 7, 4)).unwrap().unwrap();
        assert_eq!(loaded.id, entry.id);
        assert_eq!(loaded.gratitudes(), entry.gratitudes());
        assert_eq!(loaded.accomplishments(), entry.accomplishments());
        assert_eq!(loaded.memory(), entry.memory());
        assert_eq!(loaded.journal(), entry.journal());
        assert_eq!(loaded.word_count(), 5);
        assert_eq!(loaded.created_at, entry.created_at);

        assert!(db.find_entry_by_day(day(2024, 7, 5)).unwrap().is_none());
    }

    #[test]
    fn test_todo_update_and_delete() {
        let mut db = Database::open_in_memory().unwrap();
        let mut todo = Todo::new("renew passport", day(2024, 7, 4)).unwrap();
        db.insert_todo(&todo).unwrap();

        todo.toggle();
        todo.move_to(day(2024, 7, 6));
        db.update_todo(&todo).unwrap();

        let loaded = db.find_todo(todo.id).unwrap().unwrap();
        assert!(loaded.completed);
        assert_eq!(loaded.date, day(2024, 7, 6));

        db.delete_todo(todo.id).unwrap();
        assert!(db.find_todo(todo.id).unwrap().is_none());
    }

    #[test]
    fn test_save_closes_batch() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(!db.has_unsaved_changes());

        db.insert_entry(&Entry::new(day(2024, 1, 1))).unwrap();
        assert!(db.has_unsaved_changes());

        db.save().unwrap();
        assert!(!db.has_unsaved_changes());
        assert_eq!(db.all_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_all_clears_both_tables() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_entry(&Entry::new(day(2024, 1, 1))).unwrap();
        db.insert_todo(&Todo::new("stretch", day(2024, 1, 1)).unwrap())
            .unwrap();
        db.save().unwrap();

        db.delete_all().unwrap();
        db.save().unwrap();
        assert!(db.all_entries().unwrap().is_empty());
        assert!(db.all_todos().unwrap().is_empty());
    }

    #[test]
    fn test_full_disk_discards_batch_and_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.db");
        let mut db = Database::new(path.to_str().unwrap()).unwrap();

        let pages: i64 = db
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))
            .unwrap();
        let _: i64 = db
            .conn
            .query_row(&format!("PRAGMA max_page_count = {}", pages + 3), [], |row| {
                row.get(0)
            })
            .unwrap();

        let journal = "word ".repeat(2000);
        let mut failure = None;
        for d in 1..=28 {
            let mut entry = Entry::new(day(2024, 2, d));
            entry.set_journal(Some(journal.clone()));
            if let Err(err) = db.insert_entry(&entry) {
                failure = Some(err);
                break;
            }
        }

        let err = failure.unwrap();
        assert!(matches!(err, PersistenceError::BatchDiscarded(_)), "{err}");
        assert!(!db.has_unsaved_changes());
        assert!(db.all_entries().unwrap().is_empty());
        db.save().unwrap();

        let _: i64 = db
            .conn
            .query_row("PRAGMA max_page_count = 1000000", [], |row| row.get(0))
            .unwrap();
        db.insert_entry(&Entry::new(day(2024, 3, 1))).unwrap();
        assert!(db.has_unsaved_changes());
        assert!(!db.conn.is_autocommit());
        db.save().unwrap();
        assert_eq!(db.all_entries().unwrap().len(), 1);
    }
}
