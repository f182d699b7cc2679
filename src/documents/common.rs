//! Common utilities for document generation.
//!
//! Shared helpers for HTML escaping, date formatting, and output filenames.

use chrono::{Local, NaiveDate};

/// Format a date the way pt-BR browsers print `toLocaleDateString` (e.g., "19/10/2026").
pub fn format_br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Today's date in pt-BR format.
pub fn today_br() -> String {
    format_br_date(Local::now().date_naive())
}

/// Escape text for safe inclusion in HTML element content or quoted attributes.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text for a double-quoted CSS string (`content: "..."`).
pub fn escape_css_string(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', r#"\""#)
}

/// Replace every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }

    trimmed
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
