//! Spending rollups bucketed by calendar month and by category.
//!
//! These are aggregate spend views: every bucket sums full expense amounts,
//! for personal and shared expenses alike. Per-user shares are the business
//! of [crate::balance], not of this module.

use std::{collections::BTreeMap, fmt::Display};

use serde::{Serialize, Serializer};
use time::Date;

use crate::{
    category::CategoryName,
    expense::{Expense, ExpenseKind},
};

/// A calendar month, used as the bucket key for monthly rollups.
///
/// Keys order chronologically and render as canonical `YYYY-MM` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u8,
}

impl MonthKey {
    /// The month containing `date`.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number, 1 through 12.
    pub fn month(&self) -> u8 {
        self.month
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The personal and shared spending subtotals within one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthTotals {
    /// The summed amounts of the month's personal expenses.
    pub personal: f64,
    /// The summed amounts of the month's shared expenses.
    pub shared: f64,
}

/// Bucketed spending totals over a set of expenses.
///
/// Produced by [summarize_expenses]. The maps are sparse: months and
/// categories without a matching expense have no entry, so callers rendering
/// a fixed window (e.g. the last six months) must pad the missing keys with
/// zeros themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpendingSummary {
    /// The sum of all expense amounts: always `personal_total + shared_total`.
    pub total_amount: f64,
    /// The summed amounts of personal expenses.
    pub personal_total: f64,
    /// The summed full amounts of shared expenses.
    pub shared_total: f64,
    /// Per-month subtotals, split personal vs. shared, in chronological order.
    pub by_month: BTreeMap<MonthKey, MonthTotals>,
    /// Per-category totals over both kinds of expense.
    pub by_category: BTreeMap<CategoryName, f64>,
}

/// Roll `expenses` up into month and category buckets.
///
/// The result depends only on the contents of `expenses`, not their order;
/// an empty input yields an empty summary.
pub fn summarize_expenses(expenses: &[Expense]) -> SpendingSummary {
    let mut summary = SpendingSummary::default();

    for expense in expenses {
        let month = summary
            .by_month
            .entry(MonthKey::from_date(expense.date))
            .or_default();

        match expense.kind {
            ExpenseKind::Personal => {
                summary.personal_total += expense.amount;
                month.personal += expense.amount;
            }
            ExpenseKind::Shared => {
                summary.shared_total += expense.amount;
                month.shared += expense.amount;
            }
        }

        *summary
            .by_category
            .entry(expense.category.clone())
            .or_insert(0.0) += expense.amount;
    }

    summary.total_amount = summary.personal_total + summary.shared_total;

    summary
}
