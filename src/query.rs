//! Filtering and sorting of expense lists for display.

use serde::{Deserialize, Serialize};

use crate::{
    category::CategoryName,
    expense::{Expense, ExpenseKind},
};

/// The field to order query results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Compare by expense date.
    Date,
    /// Compare by amount.
    Amount,
    /// Compare category names as plain byte strings, locale-independent.
    Category,
}

/// The order to sort expenses in an [ExpenseQuery].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Sort in order of increasing value.
    #[default]
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// Defines how expenses should be filtered and ordered by [search_expenses].
///
/// The three filters are combined with logical AND. The default query matches
/// everything and keeps the input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseQuery {
    /// Case-insensitive substring matched against the description or the
    /// category name. An empty string matches everything.
    #[serde(default)]
    pub search_text: String,
    /// Keep only expenses of this kind. `None` keeps all.
    #[serde(default)]
    pub kind: Option<ExpenseKind>,
    /// Keep only expenses with this category. `None` keeps all.
    #[serde(default)]
    pub category: Option<CategoryName>,
    /// Orders expenses by this key. `None` returns expenses in the order they
    /// were given.
    #[serde(default)]
    pub sort_key: Option<SortKey>,
    /// The direction applied when `sort_key` is set.
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Filter and sort `expenses` according to `query`.
///
/// Returns a new list; the input is left untouched. The sort is stable, so
/// ties keep their input order, and applying the same query to its own output
/// returns the output unchanged.
pub fn search_expenses(expenses: &[Expense], query: &ExpenseQuery) -> Vec<Expense> {
    let needle = query.search_text.to_lowercase();

    let mut results: Vec<Expense> = expenses
        .iter()
        .filter(|expense| matches_query(expense, query, &needle))
        .cloned()
        .collect();

    if let Some(sort_key) = query.sort_key {
        results.sort_by(|a, b| {
            let ordering = match sort_key {
                SortKey::Date => a.date.cmp(&b.date),
                SortKey::Amount => a.amount.total_cmp(&b.amount),
                SortKey::Category => a.category.as_ref().cmp(b.category.as_ref()),
            };

            match query.sort_order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }

    results
}

/// Whether a single expense passes all three filters.
fn matches_query(expense: &Expense, query: &ExpenseQuery, needle: &str) -> bool {
    let matches_search = needle.is_empty()
        || expense.category.as_ref().to_lowercase().contains(needle)
        || expense
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(needle));

    let matches_kind = query.kind.is_none_or(|kind| expense.kind == kind);

    let matches_category = query
        .category
        .as_ref()
        .is_none_or(|category| &expense.category == category);

    matches_search && matches_kind && matches_category
}
