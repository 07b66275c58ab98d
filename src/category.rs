//! This file defines the `CategoryName` type used for classifying expenses.
//!
//! The category set is an open vocabulary: any non-empty name is valid.
//! [DEFAULT_CATEGORIES] lists the names offered by default when recording an
//! expense, for callers that want to present a picker.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The category names offered by default when recording an expense.
pub const DEFAULT_CATEGORIES: [&str; 12] = [
    "Credit Card",
    "Supermarket",
    "Utilities",
    "Rent",
    "Transportation",
    "Entertainment",
    "Healthcare",
    "Dining",
    "Shopping",
    "Subscriptions",
    "Travel",
    "Other",
];

/// The name of an expense category, e.g., 'Supermarket', 'Rent', 'Travel'.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// Leading and trailing whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
