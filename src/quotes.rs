use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

const fn quote(text: &'static str, author: &'static str) -> Quote {
    Quote { text, author }
}

pub const QUOTES: &[Quote] = &[
    quote("The journey of a thousand miles begins with one step.", "Lao Tzu"),
    quote("What you do today can improve all your tomorrows.", "Ralph Marston"),
    quote("The only way to do great work is to love what you do.", "Steve Jobs"),
    quote("Believe you can and you're halfway there.", "Theodore Roosevelt"),
    quote(
        "The best time to plant a tree was 20 years ago. The second best time is now.",
        "Chinese Proverb",
    ),
    quote("Great things never come from comfort zones.", "Unknown"),
    quote("Don't stop when you're tired. Stop when you're done.", "Unknown"),
    quote("Wake up with determination. Go to bed with satisfaction.", "Unknown"),
    quote(
        "Do something today that your future self will thank you for.",
        "Sean Patrick Flanery",
    ),
    quote("Little things make big days.", "Unknown"),
    quote("Don't wait for opportunity. Create it.", "Unknown"),
    quote("Be grateful for what you have while working for what you want.", "Unknown"),
    quote("The secret of getting ahead is getting started.", "Mark Twain"),
    quote("In the middle of every difficulty lies opportunity.", "Albert Einstein"),
    quote("What we think, we become.", "Buddha"),
];

/// The same quote all day, cycling through the list one day at a time.
pub fn daily_quote(day: NaiveDate) -> Quote {
    let days_since_epoch = (day - DateTime::<Utc>::UNIX_EPOCH.date_naive()).num_days();
    let index = days_since_epoch.rem_euclid(QUOTES.len() as i64) as usize;
    QUOTES[index]
}
