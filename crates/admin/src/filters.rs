//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Longest text shown in a table cell before it is cut.
const EXCERPT_CHARS: usize = 80;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Cut long text for table cells.
///
/// Usage in templates: `{{ review.comment|excerpt }}`
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(cut(&value.to_string(), EXCERPT_CHARS))
}

fn cut(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_keeps_short_text() {
        assert_eq!(cut("Great sound", 80), "Great sound");
    }

    #[test]
    fn test_cut_counts_chars_not_bytes() {
        assert_eq!(cut("Âm thanh rất hay", 8), "Âm thanh…");
    }
}
