use chrono::{DateTime, Local, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Entry, EntryParts, Todo};
use crate::store::{EntityStore, PersistenceError};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize export: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("Failed to write export file: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Malformed export file: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Export file has no version field")]
    MissingVersion,
    #[error("Unsupported export version: {0}")]
    UnsupportedVersion(String),
    #[error("Failed to read export file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Store error during import: {0}")]
    PersistenceError(#[from] PersistenceError),
}

/// RFC 3339 timestamps in UTC with as many fractional digits as needed.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
    }
}

/// Calendar days written as the local-midnight timestamp of the day.
mod day_stamp {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::day_to_timestamp(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_day(&raw).map_err(serde::de::Error::custom)
    }
}

fn day_to_timestamp(day: NaiveDate) -> String {
    let midnight = day.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => midnight.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Accepts a bare `YYYY-MM-DD` or an RFC 3339 timestamp, read in local time.
fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local).date_naive())
        .map_err(|e| format!("invalid date '{raw}': {e}"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: String,
    #[serde(alias = "exportDate", with = "timestamp")]
    pub exported_at: DateTime<Utc>,
    pub entries: Vec<ExportedEntry>,
    pub todos: Vec<ExportedTodo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedEntry {
    pub id: String,
    #[serde(with = "day_stamp")]
    pub date: NaiveDate,
    pub gratitudes: Vec<String>,
    pub memory: Option<String>,
    pub accomplishments: Vec<String>,
    pub journal: Option<String>,
    /// Informational; recomputed from `journal` on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedTodo {
    pub id: String,
    #[serde(with = "day_stamp")]
    pub date: NaiveDate,
    pub title: String,
    pub completed: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Entry> for ExportedEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.to_string(),
            date: entry.date,
            gratitudes: entry.gratitudes().to_vec(),
            memory: entry.memory().map(str::to_string),
            accomplishments: entry.accomplishments().to_vec(),
            journal: entry.journal().map(str::to_string),
            word_count: Some(entry.word_count()),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

impl From<&Todo> for ExportedTodo {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.to_string(),
            date: todo.date,
            title: todo.title.clone(),
            completed: todo.completed,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

impl ExportEnvelope {
    pub fn new(entries: &[Entry], todos: &[Todo], exported_at: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at,
            entries: entries.iter().map(ExportedEntry::from).collect(),
            todos: todos.iter().map(ExportedTodo::from).collect(),
        }
    }
}

/// Serialize both collections into a pretty-printed export document.
pub fn encode(entries: &[Entry], todos: &[Todo], now: DateTime<Utc>) -> Result<String, ExportError> {
    let envelope = ExportEnvelope::new(entries, todos, now);
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse and validate an export document without touching any store.
pub fn decode(text: &str) -> Result<ExportEnvelope, ImportError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    match value.get("version").and_then(serde_json::Value::as_str) {
        Some(EXPORT_VERSION) => {}
        Some(other) => return Err(ImportError::UnsupportedVersion(other.to_string())),
        None => return Err(ImportError::MissingVersion),
    }
    Ok(serde_json::from_value(value)?)
}

/// Counts of what an import did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub entries_inserted: usize,
    pub entries_updated: usize,
    pub todos_inserted: usize,
    pub todos_updated: usize,
    pub todos_skipped: usize,
}

fn parse_id(raw: &str) -> Option<Uuid> {
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(err) => {
            warn!("import record has unusable id '{raw}' ({err}); assigning a new one");
            None
        }
    }
}

/// Upsert every record of `envelope` into `store` by id, then save.
///
/// The document is fully parsed before this runs. Records are applied one by
/// one and saved once at the end, so a failure part way leaves earlier records
/// applied but unsaved; `has_unsaved_changes()` reports this and the caller
/// decides whether to retry `save()`.
///
/// Existing records get their content and `updated_at` replaced while `date`
/// and `created_at` are kept. New records keep the id, date and timestamps
/// from the file. Records with an unparseable id are always inserted under a
/// fresh id.
pub fn apply<S: EntityStore + ?Sized>(
    envelope: ExportEnvelope,
    store: &mut S,
) -> Result<ImportSummary, ImportError> {
    let mut summary = ImportSummary::default();

    for record in envelope.entries {
        let id = parse_id(&record.id);
        let existing = match id {
            Some(id) => store.find_entry(id)?,
            None => None,
        };

        match existing {
            Some(mut entry) => {
                entry.merge_content(
                    record.gratitudes,
                    record.memory,
                    record.accomplishments,
                    record.journal,
                    record.updated_at,
                );
                store.update_entry(&entry)?;
                summary.entries_updated += 1;
            }
            None => {
                if store.find_entry_by_day(record.date)?.is_some() {
                    warn!("imported entry for {} shares its day with an existing entry", record.date);
                }
                let entry = Entry::from_parts(EntryParts {
                    id: id.unwrap_or_else(Uuid::new_v4),
                    date: record.date,
                    gratitudes: record.gratitudes,
                    memory: record.memory,
                    accomplishments: record.accomplishments,
                    journal: record.journal,
                    created_at: record.created_at,
                    updated_at: record.updated_at,
                });
                store.insert_entry(&entry)?;
                summary.entries_inserted += 1;
            }
        }
    }

    for record in envelope.todos {
        let title = record.title.trim();
        if title.is_empty() {
            warn!("skipping imported todo {} with a blank title", record.id);
            summary.todos_skipped += 1;
            continue;
        }

        let id = parse_id(&record.id);
        let existing = match id {
            Some(id) => store.find_todo(id)?,
            None => None,
        };

        match existing {
            Some(mut todo) => {
                todo.title = title.to_string();
                todo.completed = record.completed;
                todo.updated_at = record.updated_at;
                store.update_todo(&todo)?;
                summary.todos_updated += 1;
            }
            None => {
                let todo = Todo {
                    id: id.unwrap_or_else(Uuid::new_v4),
                    date: record.date,
                    title: title.to_string(),
                    completed: record.completed,
                    created_at: record.created_at,
                    updated_at: record.updated_at,
                };
                store.insert_todo(&todo)?;
                summary.todos_inserted += 1;
            }
        }
    }

    store.save()?;
    info!(
        "import finished: {} entries inserted, {} updated; {} todos inserted, {} updated, {} skipped",
        summary.entries_inserted,
        summary.entries_updated,
        summary.todos_inserted,
        summary.todos_updated,
        summary.todos_skipped
    );
    Ok(summary)
}

pub fn import_str<S: EntityStore + ?Sized>(
    text: &str,
    store: &mut S,
) -> Result<ImportSummary, ImportError> {
    apply(decode(text)?, store)
}

pub fn import_file<S: EntityStore + ?Sized>(
    path: &Path,
    store: &mut S,
) -> Result<ImportSummary, ImportError> {
    let text = fs::read_to_string(path)?;
    import_str(&text, store)
}

/// `plume-export-YYYY-MM-DD.json`
pub fn export_filename(day: NaiveDate) -> String {
    format!("plume-export-{}.json", day.format("%Y-%m-%d"))
}

/// Write an export document into `dir` and return its path.
pub fn write_export(
    dir: &Path,
    entries: &[Entry],
    todos: &[Todo],
    now: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let text = encode(entries, todos, now)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(now.with_timezone(&Local).date_naive()));
    fs::write(&path, text)?;
    info!(
        "exported {} entries and {} todos to {}",
        entries.len(),
        todos.len(),
        path.display()
    );
    Ok(path)
}

/// Human-readable dump of entries, one block per day.
pub fn plain_text_digest(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("=== {} ===\n\n", entry.date.format("%A, %B %-d, %Y")));

        if let Some(journal) = entry.journal().filter(|j| !j.is_empty()) {
            out.push_str(&format!("Journal:\n{journal}\n\n"));
        }
        if entry.has_gratitudes() {
            out.push_str(&format!("Gratitude:\n{}\n\n", bullets(entry.gratitudes())));
        }
        if let Some(memory) = entry.memory().filter(|m| !m.is_empty()) {
            out.push_str(&format!("Memory:\n{memory}\n\n"));
        }
        if entry.has_accomplishments() {
            out.push_str(&format!(
                "Accomplishments:\n{}\n\n",
                bullets(entry.accomplishments())
            ));
        }

        out.push_str("---\n\n");
    }
    out
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
