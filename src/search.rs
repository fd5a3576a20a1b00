use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Entry, SectionKind};

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub entry_id: Uuid,
    pub date: NaiveDate,
    pub kind: SectionKind,
    /// The full text of the matching item.
    pub content: String,
    /// Short excerpt to display; for journals, the matching sentence.
    pub preview: String,
}

/// First sentence mentioning `term`, capped at 100 characters.
fn journal_preview(journal: &str, term: &str) -> String {
    let sentence = journal
        .split(['.', '!', '?'])
        .find(|s| s.to_lowercase().contains(term))
        .map(str::trim)
        .unwrap_or(journal);
    let preview: String = sentence.chars().take(PREVIEW_CHARS).collect();
    if preview.chars().count() < journal.chars().count() {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Case-insensitive substring search over every section of every entry.
///
/// Hits whose whole content equals the query come first, then newest first.
pub fn search(entries: &[Entry], query: &str) -> Vec<SearchHit> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for entry in entries {
        let hit = |kind, content: &str, preview: String| SearchHit {
            entry_id: entry.id,
            date: entry.date,
            kind,
            content: content.to_string(),
            preview,
        };

        for gratitude in entry.gratitudes() {
            if gratitude.to_lowercase().contains(&term) {
                hits.push(hit(SectionKind::Gratitude, gratitude, gratitude.clone()));
            }
        }
        if let Some(memory) = entry.memory().filter(|m| m.to_lowercase().contains(&term)) {
            hits.push(hit(SectionKind::Memory, memory, memory.to_string()));
        }
        for accomplishment in entry.accomplishments() {
            if accomplishment.to_lowercase().contains(&term) {
                hits.push(hit(
                    SectionKind::Accomplishments,
                    accomplishment,
                    accomplishment.clone(),
                ));
            }
        }
        if let Some(journal) = entry.journal().filter(|j| j.to_lowercase().contains(&term)) {
            hits.push(hit(
                SectionKind::Journal,
                journal,
                journal_preview(journal, &term),
            ));
        }
    }

    hits.sort_by(|a, b| {
        let a_exact = a.content.to_lowercase() == term;
        let b_exact = b.content.to_lowercase() == term;
        b_exact.cmp(&a_exact).then_with(|| b.date.cmp(&a.date))
    });
    hits
}
