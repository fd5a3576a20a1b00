use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Entry, Todo};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
    #[error("Unsaved changes were discarded by the database: {0}")]
    BatchDiscarded(String),
}

/// Keyed repository over entries and todos.
///
/// Mutations are staged until `save()` is called. Implementations are not
/// thread-safe; callers serialize access through a single owner.
pub trait EntityStore {
    /// The entry whose date falls on `day`, if any.
    fn find_entry_by_day(&self, day: NaiveDate) -> Result<Option<Entry>, PersistenceError>;
    fn find_entry(&self, id: Uuid) -> Result<Option<Entry>, PersistenceError>;
    fn find_todo(&self, id: Uuid) -> Result<Option<Todo>, PersistenceError>;
    fn all_entries(&self) -> Result<Vec<Entry>, PersistenceError>;
    fn all_todos(&self) -> Result<Vec<Todo>, PersistenceError>;

    fn insert_entry(&mut self, entry: &Entry) -> Result<(), PersistenceError>;
    fn update_entry(&mut self, entry: &Entry) -> Result<(), PersistenceError>;
    fn delete_entry(&mut self, id: Uuid) -> Result<(), PersistenceError>;

    fn insert_todo(&mut self, todo: &Todo) -> Result<(), PersistenceError>;
    fn update_todo(&mut self, todo: &Todo) -> Result<(), PersistenceError>;
    fn delete_todo(&mut self, id: Uuid) -> Result<(), PersistenceError>;

    fn delete_all(&mut self) -> Result<(), PersistenceError>;

    /// Flush staged mutations to durable storage.
    fn save(&mut self) -> Result<(), PersistenceError>;
    fn has_unsaved_changes(&self) -> bool;
}

/// Volatile store backed by vectors. `save()` only clears the dirty flag.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<Entry>,
    todos: Vec<Todo>,
    dirty: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for MemoryStore {
    fn find_entry_by_day(&self, day: NaiveDate) -> Result<Option<Entry>, PersistenceError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.date == day)
            .min_by_key(|e| e.created_at)
            .cloned())
    }

    fn find_entry(&self, id: Uuid) -> Result<Option<Entry>, PersistenceError> {
        Ok(self.entries.iter().find(|e| e.id == id).cloned())
    }

    fn find_todo(&self, id: Uuid) -> Result<Option<Todo>, PersistenceError> {
        Ok(self.todos.iter().find(|t| t.id == id).cloned())
    }

    fn all_entries(&self) -> Result<Vec<Entry>, PersistenceError> {
        Ok(self.entries.clone())
    }

    fn all_todos(&self) -> Result<Vec<Todo>, PersistenceError> {
        Ok(self.todos.clone())
    }

    fn insert_entry(&mut self, entry: &Entry) -> Result<(), PersistenceError> {
        self.entries.push(entry.clone());
        self.dirty = true;
        Ok(())
    }

    fn update_entry(&mut self, entry: &Entry) -> Result<(), PersistenceError> {
        if let Some(slot) = self.entries.iter_mut().find(|e| e.id == entry.id) {
            *slot = entry.clone();
            self.dirty = true;
        }
        Ok(())
    }

    fn delete_entry(&mut self, id: Uuid) -> Result<(), PersistenceError> {
        self.entries.retain(|e| e.id != id);
        self.dirty = true;
        Ok(())
    }

    fn insert_todo(&mut self, todo: &Todo) -> Result<(), PersistenceError> {
        self.todos.push(todo.clone());
        self.dirty = true;
        Ok(())
    }

    fn update_todo(&mut self, todo: &Todo) -> Result<(), PersistenceError> {
        if let Some(slot) = self.todos.iter_mut().find(|t| t.id == todo.id) {
            *slot = todo.clone();
            self.dirty = true;
        }
        Ok(())
    }

    fn delete_todo(&mut self, id: Uuid) -> Result<(), PersistenceError> {
        self.todos.retain(|t| t.id != id);
        self.dirty = true;
        Ok(())
    }

    fn delete_all(&mut self) -> Result<(), PersistenceError> {
        self.entries.clear();
        self.todos.clear();
        self.dirty = true;
        Ok(())
    }

    fn save(&mut self) -> Result<(), PersistenceError> {
        self.dirty = false;
        Ok(())
    }

    fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }
}
