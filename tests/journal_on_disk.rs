use chrono::{NaiveDate, Utc};
use plume::export;
use plume::{Database, EntityStore, JournalService};
use tempfile::TempDir;

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn open(dir: &TempDir) -> JournalService<Database> {
    let path = dir.path().join("data").join("plume.db");
    JournalService::new(Database::new(path.to_str().unwrap()).unwrap())
}

fn write_week(journal: &mut JournalService<Database>) {
    for d in 1..=7 {
        journal
            .set_journal(day(4, d), Some(format!("day {d} of the spring walk")))
            .unwrap();
        journal.add_gratitude(day(4, d), "long light").unwrap();
    }
    journal.set_memory(day(4, 3), Some("first swallow".to_string())).unwrap();
    journal.add_accomplishment(day(4, 5), "hung the shelves").unwrap();

    let todo = journal.create_todo("fix bike chain", day(4, 6)).unwrap();
    journal.toggle_todo(todo.id).unwrap();
    journal.create_todo("plant beans", day(4, 8)).unwrap();
    journal.save().unwrap();
}

#[test]
fn saved_changes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut journal = open(&dir);
        write_week(&mut journal);
    }

    let journal = open(&dir);
    assert_eq!(journal.all_entries().unwrap().len(), 7);
    assert_eq!(journal.all_todos().unwrap().len(), 2);
    assert_eq!(journal.calculate_streak(day(4, 8)).unwrap(), 7);
    assert_eq!(journal.total_word_count().unwrap(), 7 * 6);

    let entry = journal.entry_for(day(4, 3)).unwrap().unwrap();
    assert_eq!(entry.memory(), Some("first swallow"));
}

#[test]
fn unsaved_changes_are_discarded_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut journal = open(&dir);
        journal.add_gratitude(day(5, 1), "kept").unwrap();
        journal.save().unwrap();

        journal.add_gratitude(day(5, 2), "never saved").unwrap();
        assert!(journal.has_unsaved_changes());
    }

    let journal = open(&dir);
    assert!(journal.entry_for(day(5, 1)).unwrap().is_some());
    assert!(journal.entry_for(day(5, 2)).unwrap().is_none());
}

#[test]
fn export_wipe_import_restores_everything() {
    let dir = tempfile::tempdir().unwrap();
    let mut journal = open(&dir);
    write_week(&mut journal);

    let entries = journal.all_entries().unwrap();
    let todos = journal.all_todos().unwrap();
    let path = export::write_export(&dir.path().join("exports"), &entries, &todos, Utc::now())
        .unwrap();
    assert!(
        path.file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("plume-export-")
    );

    assert!(journal.delete_all_data());
    assert!(journal.all_entries().unwrap().is_empty());

    let summary = export::import_file(&path, journal.store_mut()).unwrap();
    assert_eq!(summary.entries_inserted, entries.len());
    assert_eq!(summary.todos_inserted, todos.len());
    assert!(!journal.has_unsaved_changes());

    let restored = journal.all_entries().unwrap();
    for original in &entries {
        let back = restored.iter().find(|e| e.id == original.id).unwrap();
        assert_eq!(back.date, original.date);
        assert_eq!(back.gratitudes(), original.gratitudes());
        assert_eq!(back.memory(), original.memory());
        assert_eq!(back.accomplishments(), original.accomplishments());
        assert_eq!(back.journal(), original.journal());
    }
    let restored = journal.all_todos().unwrap();
    for original in &todos {
        let back = restored.iter().find(|t| t.id == original.id).unwrap();
        assert_eq!(back.title, original.title);
        assert_eq!(back.completed, original.completed);
        assert_eq!(back.date, original.date);
    }
}

#[test]
fn reimporting_the_same_file_updates_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let mut journal = open(&dir);
    write_week(&mut journal);

    let text = export::encode(
        &journal.all_entries().unwrap(),
        &journal.all_todos().unwrap(),
        Utc::now(),
    )
    .unwrap();

    let summary = export::import_str(&text, journal.store_mut()).unwrap();
    assert_eq!(summary.entries_inserted, 0);
    assert_eq!(summary.entries_updated, 7);
    assert_eq!(summary.todos_updated, 2);
    assert_eq!(journal.store().all_entries().unwrap().len(), 7);
}

#[test]
fn rejected_import_does_not_touch_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut journal = open(&dir);
    write_week(&mut journal);

    let result = export::import_str(
        r#"{"version": "9", "exportedAt": "2024-01-01T00:00:00Z", "entries": [], "todos": []}"#,
        journal.store_mut(),
    );
    assert!(result.is_err());
    assert!(!journal.has_unsaved_changes());
    assert_eq!(journal.all_entries().unwrap().len(), 7);
}
