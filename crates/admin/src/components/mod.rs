//! Reusable pieces for admin list pages.

pub mod data_table;

pub use data_table::{FilterOption, ListQuery, StatusFilter, matches_search};
