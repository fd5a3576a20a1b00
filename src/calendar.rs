use chrono::{Datelike, Days, Months, NaiveDate};
use std::collections::HashMap;
use std::fmt;

use crate::models::Entry;

pub const WEEKDAY_HEADERS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Number of weeks shown in the activity heatmap.
pub const HEATMAP_WEEKS: u64 = 53;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// `None` unless `month` is in 1..=12 and the year is representable.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn first_day(self) -> NaiveDate {
        // Validated in the constructors.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn days_in_month(self) -> u32 {
        let first = self.first_day();
        match first.checked_add_months(Months::new(1)) {
            Some(next_first) => (next_first - first).num_days() as u32,
            // Only the last representable month lacks a successor; it has 31 days.
            None => 31,
        }
    }

    /// Weekday of the 1st, 0 = Sunday.
    pub fn first_weekday_index(self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day().format("%B %Y"))
    }
}

/// Leading blanks for the days before the 1st, then one cell per day.
/// Weeks start on Sunday, matching [`WEEKDAY_HEADERS`].
///
/// The grid is not padded at the end; use [`weeks`] to get whole rows.
pub fn month_grid(month: YearMonth) -> Vec<Option<NaiveDate>> {
    let first = month.first_day();
    let blanks = month.first_weekday_index() as usize;

    let mut cells = vec![None; blanks];
    cells.extend(first.iter_days().take(month.days_in_month() as usize).map(Some));
    cells
}

/// Split a grid into rows of seven, padding the final row with blanks.
pub fn weeks(grid: &[Option<NaiveDate>]) -> Vec<[Option<NaiveDate>; 7]> {
    grid.chunks(7)
        .map(|chunk| {
            let mut row = [None; 7];
            row[..chunk.len()].copy_from_slice(chunk);
            row
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub word_count: u32,
    pub level: u8,
}

/// Bucket a day's word count into an intensity level from 0 to 4.
pub fn activity_level(word_count: u32) -> u8 {
    match word_count {
        0 => 0,
        1..=49 => 1,
        50..=199 => 2,
        200..=499 => 3,
        _ => 4,
    }
}

/// 53 weeks of cells, starting on the Sunday on or before `today - 52 weeks`.
pub fn heatmap(entries: &[Entry], today: NaiveDate) -> Vec<HeatmapCell> {
    let words_by_day: HashMap<NaiveDate, u32> =
        entries.iter().map(|e| (e.date, e.word_count())).collect();

    let Some(year_ago) = today.checked_sub_days(Days::new(52 * 7)) else {
        return Vec::new();
    };
    let back_to_sunday = u64::from(year_ago.weekday().num_days_from_sunday());
    let Some(start) = year_ago.checked_sub_days(Days::new(back_to_sunday)) else {
        return Vec::new();
    };

    start
        .iter_days()
        .take((HEATMAP_WEEKS * 7) as usize)
        .map(|date| {
            let word_count = words_by_day.get(&date).copied().unwrap_or(0);
            HeatmapCell {
                date,
                word_count,
                level: activity_level(word_count),
            }
        })
        .collect()
}
