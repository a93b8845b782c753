//! PostgREST query-string building.

use std::fmt::Display;

/// A filtered, ordered row selection.
///
/// Builds the query pairs PostgREST expects:
///
/// ```
/// use digimart_supabase::rest::Select;
///
/// let pairs = Select::new()
///     .eq("status", "pending")
///     .newest_first()
///     .limit(5)
///     .to_query_pairs();
///
/// assert_eq!(
///     pairs,
///     vec![
///         ("select".to_string(), "*".to_string()),
///         ("status".to_string(), "eq.pending".to_string()),
///         ("order".to_string(), "created_at.desc".to_string()),
///         ("limit".to_string(), "5".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Select {
    columns: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl Select {
    /// All columns, no filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `Select::new().newest_first()`, the default listing order.
    #[must_use]
    pub fn newest() -> Self {
        Self::new().newest_first()
    }

    /// Restrict the returned columns (comma-separated).
    #[must_use]
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    /// `column = value`
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// `column IN (values)`
    #[must_use]
    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let list = values
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.filters.push((column.to_string(), format!("in.({list})")));
        self
    }

    /// `column IS NOT TRUE`, matching both `false` and `null`.
    #[must_use]
    pub fn is_not_true(mut self, column: &str) -> Self {
        self.filters
            .push((column.to_string(), "not.is.true".to_string()));
        self
    }

    /// Append a descending sort key.
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(format!("{column}.desc"));
        self
    }

    /// Append an ascending sort key.
    #[must_use]
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order.push(format!("{column}.asc"));
        self
    }

    /// Sort by `created_at` descending.
    #[must_use]
    pub fn newest_first(self) -> Self {
        self.order_desc("created_at")
    }

    /// Cap the number of rows returned.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Only the filter pairs, for `PATCH`/`DELETE` targeting.
    #[must_use]
    pub fn filter_pairs(&self) -> Vec<(String, String)> {
        self.filters.clone()
    }

    /// Every query pair in a stable order: select, filters, order, limit.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);
        pairs.push((
            "select".to_string(),
            self.columns.clone().unwrap_or_else(|| "*".to_string()),
        ));
        pairs.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Parse the total from a `Content-Range` header such as `0-9/42` or `*/0`.
///
/// Returns `None` when the total is unknown (`*`) or the header is malformed.
#[must_use]
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(select: &Select) -> Vec<(String, String)> {
        select.to_query_pairs()
    }

    fn expected(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_default_selects_everything() {
        assert_eq!(pairs(&Select::new()), expected(&[("select", "*")]));
    }

    #[test]
    fn test_newest() {
        assert_eq!(
            pairs(&Select::newest()),
            expected(&[("select", "*"), ("order", "created_at.desc")])
        );
    }

    #[test]
    fn test_filters_keep_insertion_order() {
        let select = Select::new()
            .eq("user_id", "u-1")
            .eq("role", "admin")
            .columns("id");
        assert_eq!(
            pairs(&select),
            expected(&[
                ("select", "id"),
                ("user_id", "eq.u-1"),
                ("role", "eq.admin")
            ])
        );
    }

    #[test]
    fn test_in_list_and_boolean_filters() {
        let select = Select::new()
            .in_list("status", ["requested", "approved"])
            .is_not_true("is_approved");
        assert_eq!(
            select.filter_pairs(),
            vec![
                ("status".to_string(), "in.(requested,approved)".to_string()),
                ("is_approved".to_string(), "not.is.true".to_string()),
            ]
        );
    }

    #[test]
    fn test_multiple_sort_keys() {
        let select = Select::new().order_desc("featured").order_asc("name");
        assert_eq!(
            pairs(&select),
            expected(&[("select", "*"), ("order", "featured.desc,name.asc")])
        );
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("0-9/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
