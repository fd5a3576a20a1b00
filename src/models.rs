use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyText(&'static str),
}

/// Count whitespace-delimited tokens, the way `word_count` is derived from `journal`.
pub fn count_words(text: Option<&str>) -> u32 {
    text.map(|t| t.split_whitespace().count() as u32).unwrap_or(0)
}

fn non_blank(text: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText(field));
    }
    Ok(trimmed.to_string())
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// The journal record for one calendar day.
///
/// Content fields are private so that `word_count` always matches `journal`
/// and every write bumps `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: Uuid,
    pub date: NaiveDate,
    gratitudes: Vec<String>,
    memory: Option<String>,
    accomplishments: Vec<String>,
    journal: Option<String>,
    word_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw field values used to rebuild an entry from storage or an import file.
#[derive(Debug, Clone)]
pub struct EntryParts {
    pub id: Uuid,
    pub date: NaiveDate,
    pub gratitudes: Vec<String>,
    pub memory: Option<String>,
    pub accomplishments: Vec<String>,
    pub journal: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            date,
            gratitudes: Vec::new(),
            memory: None,
            accomplishments: Vec::new(),
            journal: None,
            word_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild an entry with its original identity and timestamps.
    /// The word count is recomputed, never trusted from the source.
    pub fn from_parts(parts: EntryParts) -> Self {
        let word_count = count_words(parts.journal.as_deref());
        Self {
            id: parts.id,
            date: parts.date,
            gratitudes: parts.gratitudes,
            memory: parts.memory,
            accomplishments: parts.accomplishments,
            journal: parts.journal,
            word_count,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }

    pub fn gratitudes(&self) -> &[String] {
        &self.gratitudes
    }

    pub fn memory(&self) -> Option<&str> {
        self.memory.as_deref()
    }

    pub fn accomplishments(&self) -> &[String] {
        &self.accomplishments
    }

    pub fn journal(&self) -> Option<&str> {
        self.journal.as_deref()
    }

    pub fn word_count(&self) -> u32 {
        self.word_count
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn add_gratitude(&mut self, text: &str) -> Result<(), ValidationError> {
        self.gratitudes.push(non_blank(text, "gratitude")?);
        self.touch();
        Ok(())
    }

    pub fn add_accomplishment(&mut self, text: &str) -> Result<(), ValidationError> {
        self.accomplishments.push(non_blank(text, "accomplishment")?);
        self.touch();
        Ok(())
    }

    /// Replace all gratitudes with the non-blank lines of `text`.
    pub fn replace_gratitudes(&mut self, text: &str) {
        self.gratitudes = non_blank_lines(text);
        self.touch();
    }

    /// Replace all accomplishments with the non-blank lines of `text`.
    pub fn replace_accomplishments(&mut self, text: &str) {
        self.accomplishments = non_blank_lines(text);
        self.touch();
    }

    pub fn set_memory(&mut self, memory: Option<String>) {
        self.memory = memory;
        self.touch();
    }

    pub fn set_journal(&mut self, journal: Option<String>) {
        self.word_count = count_words(journal.as_deref());
        self.journal = journal;
        self.touch();
    }

    /// Overwrite the content fields in one step, keeping `updated_at` as given.
    /// Used when merging an imported record into an existing one.
    pub fn merge_content(
        &mut self,
        gratitudes: Vec<String>,
        memory: Option<String>,
        accomplishments: Vec<String>,
        journal: Option<String>,
        updated_at: DateTime<Utc>,
    ) {
        self.gratitudes = gratitudes;
        self.memory = memory;
        self.accomplishments = accomplishments;
        self.word_count = count_words(journal.as_deref());
        self.journal = journal;
        self.updated_at = updated_at;
    }

    pub fn has_gratitudes(&self) -> bool {
        !self.gratitudes.is_empty()
    }

    pub fn has_memory(&self) -> bool {
        self.memory.as_deref().is_some_and(|m| !m.is_empty())
    }

    pub fn has_accomplishments(&self) -> bool {
        !self.accomplishments.is_empty()
    }

    pub fn has_journal(&self) -> bool {
        self.journal.as_deref().is_some_and(|j| !j.is_empty())
    }

    /// Non-empty content sections, in display order.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();
        if self.has_gratitudes() {
            sections.push(Section {
                kind: SectionKind::Gratitude,
                body: SectionBody::List(self.gratitudes.clone()),
            });
        }
        if let Some(memory) = self.memory.as_ref().filter(|m| !m.is_empty()) {
            sections.push(Section {
                kind: SectionKind::Memory,
                body: SectionBody::Text(memory.clone()),
            });
        }
        if self.has_accomplishments() {
            sections.push(Section {
                kind: SectionKind::Accomplishments,
                body: SectionBody::List(self.accomplishments.clone()),
            });
        }
        if let Some(journal) = self.journal.as_ref().filter(|j| !j.is_empty()) {
            sections.push(Section {
                kind: SectionKind::Journal,
                body: SectionBody::Text(journal.clone()),
            });
        }
        sections
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Gratitude,
    Memory,
    Accomplishments,
    Journal,
}

impl SectionKind {
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Gratitude => "Gratitude",
            SectionKind::Memory => "Memory",
            SectionKind::Accomplishments => "Accomplishments",
            SectionKind::Journal => "Journal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub body: SectionBody,
}

/// A task attached to a calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub id: Uuid,
    pub date: NaiveDate,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(title: &str, date: NaiveDate) -> Result<Self, ValidationError> {
        let title = non_blank(title, "todo title")?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            date,
            title,
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
        self.updated_at = Utc::now();
    }

    pub fn move_to(&mut self, date: NaiveDate) {
        self.date = date;
        self.updated_at = Utc::now();
    }

    pub fn rename(&mut self, title: &str) -> Result<(), ValidationError> {
        self.title = non_blank(title, "todo title")?;
        self.updated_at = Utc::now();
        Ok(())
    }
}
