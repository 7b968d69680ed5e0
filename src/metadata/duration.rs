//! Duration and date normalization.
//!
//! Durations arrive as ISO-8601 tokens (`PT1H2M3S`) from structured data or as player
//! display strings (`4:13`, `1:02:03`). Both normalize to the same display form.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

fn iso_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.\d+)?S)?$")
            .expect("Invalid regex")
    })
}

/// Parse a duration into whole seconds.
pub fn parse_duration(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.starts_with('P') {
        return parse_iso8601(raw);
    }

    let parts: Vec<&str> = raw.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let numbers: Option<Vec<u64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
    let numbers = numbers?;

    // Minutes and seconds after the leading field must be below 60
    if numbers[1..].iter().any(|&n| n >= 60) {
        return None;
    }

    Some(numbers.iter().fold(0, |acc, n| acc * 60 + n))
}

fn parse_iso8601(raw: &str) -> Option<u64> {
    let caps = iso_regex().captures(raw)?;
    let field = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    // "PT" alone carries no components
    if (1..=4).all(|i| caps.get(i).is_none()) {
        return None;
    }

    Some(field(1) * 86_400 + field(2) * 3600 + field(3) * 60 + field(4))
}

/// Format seconds as `M:SS`, or `H:MM:SS` from one hour up.
pub fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Parse and re-format any supported duration.
pub fn normalize_duration(raw: &str) -> Option<String> {
    parse_duration(raw).map(format_seconds)
}

/// Normalize a publish date to `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }

    let date_part = raw.get(..10).unwrap_or(raw);
    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }

    ["%b %d, %Y", "%B %d, %Y", "%d %b %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Keep the digits of a view count (`"1,234,567 views"` → `"1234567"`).
pub fn normalize_view_count(raw: &str) -> Option<String> {
    let token = raw.split_whitespace().next()?;
    let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || token.chars().any(|c| !(c.is_ascii_digit() || c == ',' || c == '.')) {
        return None;
    }
    Some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_and_display_forms_agree() {
        assert_eq!(normalize_duration("PT4M13S").as_deref(), Some("4:13"));
        assert_eq!(normalize_duration("4:13").as_deref(), Some("4:13"));
        assert_eq!(normalize_duration("04:13").as_deref(), Some("4:13"));

        assert_eq!(normalize_duration("PT1H2M3S").as_deref(), Some("1:02:03"));
        assert_eq!(normalize_duration("1:02:03").as_deref(), Some("1:02:03"));
        assert_eq!(normalize_duration("62:03").as_deref(), Some("1:02:03"));
    }

    #[test]
    fn test_partial_iso_tokens() {
        assert_eq!(parse_duration("PT45S"), Some(45));
        assert_eq!(parse_duration("PT2H"), Some(7200));
        assert_eq!(parse_duration("PT10M"), Some(600));
        assert_eq!(parse_duration("P1DT1S"), Some(86_401));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("PT"), None);
        assert_eq!(parse_duration("4:75"), None);
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("1:2:3:4"), None);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0), "0:00");
        assert_eq!(format_seconds(59), "0:59");
        assert_eq!(format_seconds(3600), "1:00:00");
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2024-03-05T17:00:07+00:00").as_deref(), Some("2024-03-05"));
        assert_eq!(normalize_date("2024-03-05").as_deref(), Some("2024-03-05"));
        assert_eq!(normalize_date("Tue, 5 Mar 2024 10:00:00 +0000").as_deref(), Some("2024-03-05"));
        assert_eq!(normalize_date("Mar 5, 2024").as_deref(), Some("2024-03-05"));
        assert_eq!(normalize_date("yesterday"), None);
    }

    #[test]
    fn test_normalize_view_count() {
        assert_eq!(normalize_view_count("1,234,567 views").as_deref(), Some("1234567"));
        assert_eq!(normalize_view_count("42").as_deref(), Some("42"));
        assert_eq!(normalize_view_count("No views"), None);
    }
}
