//! Search and filter helpers shared by the admin list pages.
//!
//! Lists are fetched whole from the gateway and narrowed here, so search is
//! a case-insensitive substring match over a few text columns and the
//! status dropdown is either "all" or one wire value.

use std::str::FromStr;

use serde::Deserialize;

/// Value of the status dropdown that disables the filter.
pub const ALL: &str = "all";

/// `?q=&status=` query parameters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ListQuery {
    /// The search term, trimmed and lowercased, or `None` when blank.
    #[must_use]
    pub fn needle(&self) -> Option<String> {
        let q = self.q.trim();
        (!q.is_empty()).then(|| q.to_lowercase())
    }

    /// The raw status choice, defaulting to "all".
    #[must_use]
    pub fn status_value(&self) -> &str {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(ALL)
    }

    /// Parse the status dropdown. Unknown values fall back to "all".
    #[must_use]
    pub fn status_filter<T: FromStr>(&self) -> StatusFilter<T> {
        StatusFilter::parse(self.status_value())
    }
}

/// Whether any of `fields` contains `needle` (already lowercased).
///
/// A missing needle matches everything.
#[must_use]
pub fn matches_search(needle: Option<&str>, fields: &[&str]) -> bool {
    needle.is_none_or(|n| fields.iter().any(|f| f.to_lowercase().contains(n)))
}

/// Parsed status dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter<T> {
    All,
    Only(T),
}

impl<T: FromStr> StatusFilter<T> {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        value.parse().map_or(Self::All, Self::Only)
    }
}

impl<T: PartialEq> StatusFilter<T> {
    #[must_use]
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

/// Option for a select dropdown.
#[derive(Debug, Clone)]
pub struct FilterOption {
    /// Option value.
    pub value: &'static str,
    /// Display label.
    pub label: &'static str,
    pub selected: bool,
}

impl FilterOption {
    /// Build dropdown options from `(value, label)` pairs.
    ///
    /// When `with_all` is set an "All" entry comes first.
    #[must_use]
    pub fn list(
        choices: impl IntoIterator<Item = (&'static str, &'static str)>,
        selected: &str,
        with_all: bool,
    ) -> Vec<Self> {
        let all = with_all.then_some((ALL, "All"));
        all.into_iter()
            .chain(choices)
            .map(|(value, label)| Self {
                value,
                label,
                selected: value == selected,
            })
            .collect()
    }
}
