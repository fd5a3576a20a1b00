use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{Entry, Todo};

/// Consecutive days with an entry, counting back from `today`.
///
/// If today has no entry yet the count starts from yesterday, so an unwritten
/// today does not break a running streak.
pub fn streak(entries: &[Entry], today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = entries.iter().map(|e| e.date).collect();

    let mut cursor = today;
    if !days.contains(&cursor) {
        match cursor.pred_opt() {
            Some(yesterday) => cursor = yesterday,
            None => return 0,
        }
    }

    let mut count = 0;
    while days.contains(&cursor) {
        count += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    count
}

pub fn total_word_count(entries: &[Entry]) -> u64 {
    entries.iter().map(|e| u64::from(e.word_count())).sum()
}

/// Date range relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum DateWindow {
    #[value(name = "week")]
    #[serde(rename = "week")]
    LastWeek,
    #[value(name = "month")]
    #[serde(rename = "month")]
    LastMonth,
    #[value(name = "quarter")]
    #[serde(rename = "quarter")]
    LastQuarter,
    #[default]
    #[value(name = "all")]
    #[serde(rename = "all")]
    AllTime,
}

impl DateWindow {
    pub fn days(self) -> Option<u64> {
        match self {
            DateWindow::LastWeek => Some(7),
            DateWindow::LastMonth => Some(30),
            DateWindow::LastQuarter => Some(90),
            DateWindow::AllTime => None,
        }
    }

    /// First day included in the window, or `None` for all time.
    pub fn start(self, today: NaiveDate) -> Option<NaiveDate> {
        self.days().and_then(|days| today.checked_sub_days(Days::new(days)))
    }

    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self.start(today) {
            Some(start) => date >= start,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ContentFilter {
    #[default]
    All,
    Gratitude,
    Memory,
    Accomplishments,
    Journal,
}

impl ContentFilter {
    pub fn matches(self, entry: &Entry) -> bool {
        match self {
            ContentFilter::All => true,
            ContentFilter::Gratitude => entry.has_gratitudes(),
            ContentFilter::Memory => entry.has_memory(),
            ContentFilter::Accomplishments => entry.has_accomplishments(),
            ContentFilter::Journal => entry.has_journal(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    #[default]
    #[value(name = "newest")]
    DateDesc,
    #[value(name = "oldest")]
    DateAsc,
    #[value(name = "words")]
    WordCountDesc,
}

/// Window, content filter and sort order applied in that sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryQuery {
    pub window: DateWindow,
    pub content: ContentFilter,
    pub sort: SortOrder,
}

impl EntryQuery {
    pub fn apply(&self, entries: &[Entry], today: NaiveDate) -> Vec<Entry> {
        let mut selected: Vec<Entry> = entries
            .iter()
            .filter(|e| self.window.contains(e.date, today))
            .filter(|e| self.content.matches(e))
            .cloned()
            .collect();

        // sort_by is stable, so equal keys keep their input order
        match self.sort {
            SortOrder::DateDesc => selected.sort_by(|a, b| b.date.cmp(&a.date)),
            SortOrder::DateAsc => selected.sort_by(|a, b| a.date.cmp(&b.date)),
            SortOrder::WordCountDesc => {
                selected.sort_by(|a, b| b.word_count().cmp(&a.word_count()))
            }
        }
        selected
    }
}

pub fn entries_in_window(entries: &[Entry], window: DateWindow, today: NaiveDate) -> Vec<Entry> {
    entries
        .iter()
        .filter(|e| window.contains(e.date, today))
        .cloned()
        .collect()
}

/// Aggregate counts shown on the explore screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total_entries: usize,
    pub total_gratitudes: usize,
    pub memories: usize,
    pub total_accomplishments: usize,
    /// Mean word count over entries with a non-empty journal, rounded down.
    pub avg_words_per_journal: u32,
}

pub fn summarize(entries: &[Entry]) -> Summary {
    let journals: Vec<&Entry> = entries.iter().filter(|e| e.has_journal()).collect();
    let journal_words: u64 = journals.iter().map(|e| u64::from(e.word_count())).sum();
    let avg_words_per_journal = if journals.is_empty() {
        0
    } else {
        (journal_words / journals.len() as u64) as u32
    };

    Summary {
        total_entries: entries.len(),
        total_gratitudes: entries.iter().map(|e| e.gratitudes().len()).sum(),
        memories: entries.iter().filter(|e| e.has_memory()).count(),
        total_accomplishments: entries.iter().map(|e| e.accomplishments().len()).sum(),
        avg_words_per_journal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TodoFilter {
    /// Open todos due today
    #[default]
    Today,
    /// Open todos after today
    Upcoming,
    /// Every open todo
    Open,
    Completed,
}

/// Todos matching `filter`, ordered by date ascending.
pub fn filter_todos(todos: &[Todo], filter: TodoFilter, today: NaiveDate) -> Vec<Todo> {
    let mut selected: Vec<Todo> = todos
        .iter()
        .filter(|t| match filter {
            TodoFilter::Today => t.date == today && !t.completed,
            TodoFilter::Upcoming => t.date > today && !t.completed,
            TodoFilter::Open => !t.completed,
            TodoFilter::Completed => t.completed,
        })
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.date.cmp(&b.date));
    selected
}

/// Open todos dated before today.
pub fn overdue_todos(todos: &[Todo], today: NaiveDate) -> Vec<Todo> {
    let mut selected: Vec<Todo> = todos
        .iter()
        .filter(|t| t.date < today && !t.completed)
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.date.cmp(&b.date));
    selected
}
