use chrono::{DateTime, Utc};

/// Formats a billing date the way the dashboard shows it, e.g. `March 4, 2026`.
pub fn format_long_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}
