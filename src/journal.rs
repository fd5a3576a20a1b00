use chrono::{Days, NaiveDate};
use log::error;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Entry, Todo, ValidationError};
use crate::stats;
use crate::store::{EntityStore, PersistenceError};

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Persistence(#[from] PersistenceError),
    #[error("No entry with id {0}")]
    EntryNotFound(Uuid),
    #[error("No todo with id {0}")]
    TodoNotFound(Uuid),
}

/// Entry and todo operations over an injected store.
///
/// Built once at startup and passed to whatever needs it. Mutations are
/// staged in the store until [`JournalService::save`] is called.
pub struct JournalService<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> JournalService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The entry for `day`, without creating one.
    pub fn entry_for(&self, day: NaiveDate) -> Result<Option<Entry>, JournalError> {
        Ok(self.store.find_entry_by_day(day)?)
    }

    /// The entry for `day`, inserting an empty one first if the day has none.
    pub fn ensure_entry(&mut self, day: NaiveDate) -> Result<Entry, JournalError> {
        if let Some(entry) = self.store.find_entry_by_day(day)? {
            return Ok(entry);
        }
        let entry = Entry::new(day);
        self.store.insert_entry(&entry)?;
        Ok(entry)
    }

    fn edit_entry<F>(&mut self, day: NaiveDate, edit: F) -> Result<Entry, JournalError>
    where
        F: FnOnce(&mut Entry) -> Result<(), ValidationError>,
    {
        let mut entry = self.ensure_entry(day)?;
        edit(&mut entry)?;
        self.store.update_entry(&entry)?;
        Ok(entry)
    }

    pub fn add_gratitude(&mut self, day: NaiveDate, text: &str) -> Result<Entry, JournalError> {
        // Validate before touching the store so a blank item creates nothing.
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText("gratitude").into());
        }
        self.edit_entry(day, |entry| entry.add_gratitude(text))
    }

    pub fn add_accomplishment(&mut self, day: NaiveDate, text: &str) -> Result<Entry, JournalError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText("accomplishment").into());
        }
        self.edit_entry(day, |entry| entry.add_accomplishment(text))
    }

    pub fn set_memory(&mut self, day: NaiveDate, memory: Option<String>) -> Result<Entry, JournalError> {
        self.edit_entry(day, |entry| {
            entry.set_memory(memory);
            Ok(())
        })
    }

    pub fn set_journal(&mut self, day: NaiveDate, journal: Option<String>) -> Result<Entry, JournalError> {
        self.edit_entry(day, |entry| {
            entry.set_journal(journal);
            Ok(())
        })
    }

    pub fn replace_gratitudes(&mut self, day: NaiveDate, text: &str) -> Result<Entry, JournalError> {
        self.edit_entry(day, |entry| {
            entry.replace_gratitudes(text);
            Ok(())
        })
    }

    pub fn replace_accomplishments(&mut self, day: NaiveDate, text: &str) -> Result<Entry, JournalError> {
        self.edit_entry(day, |entry| {
            entry.replace_accomplishments(text);
            Ok(())
        })
    }

    pub fn delete_entry(&mut self, id: Uuid) -> Result<(), JournalError> {
        if self.store.find_entry(id)?.is_none() {
            return Err(JournalError::EntryNotFound(id));
        }
        self.store.delete_entry(id)?;
        Ok(())
    }

    pub fn all_entries(&self) -> Result<Vec<Entry>, JournalError> {
        Ok(self.store.all_entries()?)
    }

    pub fn all_todos(&self) -> Result<Vec<Todo>, JournalError> {
        Ok(self.store.all_todos()?)
    }

    pub fn create_todo(&mut self, title: &str, day: NaiveDate) -> Result<Todo, JournalError> {
        let todo = Todo::new(title, day)?;
        self.store.insert_todo(&todo)?;
        Ok(todo)
    }

    fn edit_todo<F>(&mut self, id: Uuid, edit: F) -> Result<Todo, JournalError>
    where
        F: FnOnce(&mut Todo) -> Result<(), ValidationError>,
    {
        let mut todo = self
            .store
            .find_todo(id)?
            .ok_or(JournalError::TodoNotFound(id))?;
        edit(&mut todo)?;
        self.store.update_todo(&todo)?;
        Ok(todo)
    }

    pub fn toggle_todo(&mut self, id: Uuid) -> Result<Todo, JournalError> {
        self.edit_todo(id, |todo| {
            todo.toggle();
            Ok(())
        })
    }

    pub fn rename_todo(&mut self, id: Uuid, title: &str) -> Result<Todo, JournalError> {
        self.edit_todo(id, |todo| todo.rename(title))
    }

    pub fn move_todo(&mut self, id: Uuid, day: NaiveDate) -> Result<Todo, JournalError> {
        self.edit_todo(id, |todo| {
            todo.move_to(day);
            Ok(())
        })
    }

    pub fn move_todo_to_today(&mut self, id: Uuid, today: NaiveDate) -> Result<Todo, JournalError> {
        self.move_todo(id, today)
    }

    pub fn move_todo_to_tomorrow(&mut self, id: Uuid, today: NaiveDate) -> Result<Todo, JournalError> {
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        self.move_todo(id, tomorrow)
    }

    pub fn delete_todo(&mut self, id: Uuid) -> Result<(), JournalError> {
        if self.store.find_todo(id)?.is_none() {
            return Err(JournalError::TodoNotFound(id));
        }
        self.store.delete_todo(id)?;
        Ok(())
    }

    /// Todos dated `day`, oldest first.
    pub fn todos_for_day(&self, day: NaiveDate) -> Result<Vec<Todo>, JournalError> {
        let mut todos: Vec<Todo> = self
            .store
            .all_todos()?
            .into_iter()
            .filter(|t| t.date == day)
            .collect();
        todos.sort_by_key(|t| t.created_at);
        Ok(todos)
    }

    pub fn calculate_streak(&self, today: NaiveDate) -> Result<u32, JournalError> {
        Ok(stats::streak(&self.store.all_entries()?, today))
    }

    pub fn total_word_count(&self) -> Result<u64, JournalError> {
        Ok(stats::total_word_count(&self.store.all_entries()?))
    }

    /// Remove every entry and todo and save.
    ///
    /// Failures are logged, not returned; the result only says whether the
    /// wipe went through.
    pub fn delete_all_data(&mut self) -> bool {
        let result = self.store.delete_all().and_then(|()| self.store.save());
        match result {
            Ok(()) => true,
            Err(err) => {
                error!("Failed to delete all data: {err}");
                false
            }
        }
    }

    pub fn save(&mut self) -> Result<(), JournalError> {
        Ok(self.store.save()?)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.has_unsaved_changes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::test_support::UnsaveableStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn service() -> JournalService<MemoryStore> {
        JournalService::new(MemoryStore::new())
    }

    #[test]
    fn test_entry_for_has_no_side_effects() {
        let svc = service();
        assert!(svc.entry_for(day(1)).unwrap().is_none());
        assert!(svc.all_entries().unwrap().is_empty());
        assert!(!svc.has_unsaved_changes());
    }

    #[test]
    fn test_ensure_entry_creates_once_per_day() {
        let mut svc = service();
        let first = svc.ensure_entry(day(1)).unwrap();
        let again = svc.ensure_entry(day(1)).unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(svc.all_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_section_edits_share_one_entry() {
        let mut svc = service();
        svc.add_gratitude(day(2), "  clean sheets ").unwrap();
        svc.add_accomplishment(day(2), "paid rent").unwrap();
        svc.set_memory(day(2), Some("heron on the canal".to_string()))
            .unwrap();
        let entry = svc
            .set_journal(day(2), Some("Long day but a kind one".to_string()))
            .unwrap();

        assert_eq!(entry.gratitudes(), ["clean sheets"]);
        assert_eq!(entry.accomplishments(), ["paid rent"]);
        assert_eq!(entry.memory(), Some("heron on the canal"));
        assert_eq!(entry.word_count(), 6);
        assert_eq!(svc.all_entries().unwrap().len(), 1);
        assert_eq!(svc.total_word_count().unwrap(), 6);
    }

    #[test]
    fn test_blank_item_creates_nothing() {
        let mut svc = service();
        let err = svc.add_gratitude(day(3), "   ").unwrap_err();
        assert!(matches!(err, JournalError::Validation(_)));
        assert!(svc.entry_for(day(3)).unwrap().is_none());
    }

    #[test]
    fn test_replace_lists_from_lines() {
        let mut svc = service();
        svc.add_gratitude(day(4), "old").unwrap();
        let entry = svc
            .replace_gratitudes(day(4), "first\n\n  second  \n")
            .unwrap();
        assert_eq!(entry.gratitudes(), ["first", "second"]);

        let entry = svc.replace_accomplishments(day(4), "").unwrap();
        assert!(entry.accomplishments().is_empty());
    }

    #[test]
    fn test_todo_lifecycle() {
        let mut svc = service();
        let todo = svc.create_todo("buy stamps", day(5)).unwrap();
        assert!(!todo.completed);

        let todo = svc.toggle_todo(todo.id).unwrap();
        assert!(todo.completed);

        let todo = svc.move_todo_to_tomorrow(todo.id, day(5)).unwrap();
        assert_eq!(todo.date, day(6));
        assert!(svc.todos_for_day(day(5)).unwrap().is_empty());
        assert_eq!(svc.todos_for_day(day(6)).unwrap().len(), 1);

        let todo = svc.move_todo_to_today(todo.id, day(9)).unwrap();
        assert_eq!(todo.date, day(9));

        let todo = svc.rename_todo(todo.id, "buy stamps and envelopes").unwrap();
        assert_eq!(todo.title, "buy stamps and envelopes");

        svc.delete_todo(todo.id).unwrap();
        assert!(svc.all_todos().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_ids_are_reported() {
        let mut svc = service();
        let id = Uuid::new_v4();
        assert!(matches!(svc.toggle_todo(id), Err(JournalError::TodoNotFound(x)) if x == id));
        assert!(matches!(svc.delete_todo(id), Err(JournalError::TodoNotFound(_))));
        assert!(matches!(svc.delete_entry(id), Err(JournalError::EntryNotFound(_))));
        assert!(matches!(
            svc.create_todo("", day(1)),
            Err(JournalError::Validation(_))
        ));
    }

    #[test]
    fn test_streak_through_service() {
        let mut svc = service();
        for d in [8, 9, 10] {
            svc.ensure_entry(day(d)).unwrap();
        }
        assert_eq!(svc.calculate_streak(day(10)).unwrap(), 3);
        assert_eq!(svc.calculate_streak(day(11)).unwrap(), 3);
        assert_eq!(svc.calculate_streak(day(12)).unwrap(), 0);
    }

    #[test]
    fn test_delete_all_data_and_save() {
        let mut svc = service();
        svc.add_gratitude(day(1), "sun").unwrap();
        svc.create_todo("call mum", day(1)).unwrap();
        assert!(svc.has_unsaved_changes());

        assert!(svc.delete_all_data());
        assert!(svc.all_entries().unwrap().is_empty());
        assert!(svc.all_todos().unwrap().is_empty());
        assert!(!svc.has_unsaved_changes());
    }

    #[test]
    fn test_delete_all_data_failure_is_logged_not_raised() {
        let mut svc = JournalService::new(UnsaveableStore(MemoryStore::new()));
        svc.add_gratitude(day(1), "sun").unwrap();

        assert!(!svc.delete_all_data());
        assert!(svc.has_unsaved_changes());
    }
}
