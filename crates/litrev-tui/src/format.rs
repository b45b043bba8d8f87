//! Display formatting for papers and timestamps

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Author list as it reads in a citation
pub fn format_authors(authors: &[String]) -> String {
    match authors {
        [] => "Unknown".to_string(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [a, b, c] => format!("{}, {}, and {}", a, b, c),
        [a, b, c, ..] => format!("{}, {}, {} et al.", a, b, c),
    }
}

/// Long-form date such as "January 15, 2024".
///
/// Accepts RFC 3339, naive date-times and plain `YYYY-MM-DD`; anything else
/// is returned unchanged.
pub fn format_date(input: &str) -> String {
    let trimmed = input.trim();
    let date = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => input.to_string(),
    }
}

/// Time of day of a message timestamp, or `None` if it doesn't parse
pub fn format_time(timestamp: &str) -> Option<String> {
    let trimmed = timestamp.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .map(|dt| dt.format("%H:%M:%S").to_string())
}

/// Truncate to `max` characters, appending "..." if anything was cut.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_text(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head.trim_end())
    } else {
        head
    }
}
