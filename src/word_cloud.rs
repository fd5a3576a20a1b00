use std::collections::HashMap;

use crate::models::Entry;

pub const DEFAULT_MAX_WORDS: usize = 30;

/// Shortest token that can appear in the cloud, in characters.
pub const MIN_WORD_LENGTH: usize = 3;

/// Words too common in journal writing to say anything about the writer.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with", "i", "me", "my", "myself",
    "we", "our", "you", "your", "today", "yesterday", "really", "very", "just", "so", "also",
    "then", "than", "only", "even", "much", "more", "most", "some", "any", "many", "few", "good",
    "well", "better", "best",
];

#[derive(Debug, Clone, PartialEq)]
pub struct WordCloudItem {
    pub text: String,
    pub count: usize,
    /// Min-max normalized count in `[0, 1]`.
    pub weight: f64,
}

fn significant_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= MIN_WORD_LENGTH)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}

fn entry_texts(entry: &Entry) -> impl Iterator<Item = &str> {
    entry
        .journal()
        .into_iter()
        .chain(entry.memory())
        .chain(entry.gratitudes().iter().map(String::as_str))
        .chain(entry.accomplishments().iter().map(String::as_str))
}

/// The `max_words` most frequent significant words across all entries.
///
/// Ordered by count descending, ties broken alphabetically.
pub fn word_cloud(entries: &[Entry], max_words: usize) -> Vec<WordCloudItem> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in entries.iter().flat_map(entry_texts) {
        for word in significant_words(text) {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(max_words);

    let (Some(max), Some(min)) = (
        ranked.iter().map(|(_, c)| *c).max(),
        ranked.iter().map(|(_, c)| *c).min(),
    ) else {
        return Vec::new();
    };

    ranked
        .into_iter()
        .map(|(text, count)| {
            let weight = if max == min {
                1.0
            } else {
                (count - min) as f64 / (max - min) as f64
            };
            WordCloudItem {
                text,
                count,
                weight,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry_with_journal(text: &str) -> Entry {
        let mut entry = Entry::new(NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
        entry.set_journal(Some(text.to_string()));
        entry
    }

    #[test]
    fn test_min_max_weights() {
        let entries = vec![
            entry_with_journal("apple apple apple, banana"),
            entry_with_journal("Apple! APPLE."),
        ];
        let cloud = word_cloud(&entries, DEFAULT_MAX_WORDS);

        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[0].text, "apple");
        assert_eq!(cloud[0].count, 5);
        assert_eq!(cloud[0].weight, 1.0);
        assert_eq!(cloud[1].text, "banana");
        assert_eq!(cloud[1].count, 1);
        assert_eq!(cloud[1].weight, 0.0);
    }

    #[test]
    fn test_equal_counts_get_full_weight() {
        let cloud = word_cloud(&[entry_with_journal("walk swim climb")], 10);
        assert_eq!(cloud.len(), 3);
        assert!(cloud.iter().all(|item| item.weight == 1.0));
        let words: Vec<&str> = cloud.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(words, vec!["climb", "swim", "walk"]);
    }

    #[test]
    fn test_stop_words_and_short_tokens_are_dropped() {
        let cloud = word_cloud(
            &[entry_with_journal("I am so very grateful today, it is ok")],
            10,
        );
        let words: Vec<&str> = cloud.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(words, vec!["grateful"]);
    }

    #[test]
    fn test_all_sections_contribute() {
        let mut entry = Entry::new(NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
        entry.add_gratitude("garden").unwrap();
        entry.add_accomplishment("garden beds").unwrap();
        entry.set_memory(Some("garden party".to_string()));

        let cloud = word_cloud(&[entry], 10);
        assert_eq!(cloud[0].text, "garden");
        assert_eq!(cloud[0].count, 3);
    }

    #[test]
    fn test_truncates_to_max_words() {
        let cloud = word_cloud(
            &[entry_with_journal("alpha alpha alpha beta beta gamma delta")],
            2,
        );
        let words: Vec<&str> = cloud.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(words, vec!["alpha", "beta"]);
        assert_eq!(cloud[1].weight, 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(word_cloud(&[], DEFAULT_MAX_WORDS).is_empty());
        assert!(word_cloud(&[entry_with_journal("a an the")], DEFAULT_MAX_WORDS).is_empty());
        assert!(word_cloud(&[entry_with_journal("apple")], 0).is_empty());
    }
}
