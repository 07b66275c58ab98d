//! Expense management for the shared-expense engine.
//!
//! This module contains everything related to expense records:
//! - The `Expense` model and `ExpenseDraft` for creating expenses
//! - Database functions for storing, listing, and deleting expenses
//!
//! Expenses are immutable once created: they can be listed and deleted (by
//! their owner only), but there is no partial-field update.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, category::CategoryName, database_id::DatabaseID, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// Whether an expense is owned outright or split with other users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseKind {
    /// The owner carries the full amount alone.
    Personal,
    /// The amount is split evenly between the owner and the participants.
    Shared,
}

impl ExpenseKind {
    /// The kind as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseKind::Personal => "personal",
            ExpenseKind::Shared => "shared",
        }
    }
}

/// A record of money spent by a user, possibly split with other users.
///
/// To create a new `Expense`, build an [ExpenseDraft] via [Expense::personal]
/// or [Expense::shared] and pass it to [create_expense].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: DatabaseID,
    /// The user who recorded and paid the expense.
    pub owner_id: UserID,
    /// The amount of money spent, in major currency units. Never negative.
    pub amount: f64,
    /// When the expense happened.
    pub date: Date,
    /// The category the expense is filed under.
    pub category: CategoryName,
    /// An optional text description of what the expense was for.
    pub description: Option<String>,
    /// Whether the expense is personal or shared.
    pub kind: ExpenseKind,
    /// The users sharing the cost, excluding the owner.
    ///
    /// Empty for personal expenses. Order carries no meaning.
    pub participants: Vec<UserID>,
}

impl Expense {
    /// Start a draft for a personal expense.
    ///
    /// Shortcut for [ExpenseDraft] for discoverability.
    pub fn personal(
        owner_id: UserID,
        amount: f64,
        date: Date,
        category: CategoryName,
    ) -> ExpenseDraft {
        ExpenseDraft {
            owner_id,
            amount,
            date,
            category,
            description: None,
            kind: ExpenseKind::Personal,
            participants: Vec::new(),
        }
    }

    /// Start a draft for an expense shared between `owner_id` and
    /// `participants`.
    pub fn shared(
        owner_id: UserID,
        amount: f64,
        date: Date,
        category: CategoryName,
        participants: Vec<UserID>,
    ) -> ExpenseDraft {
        ExpenseDraft {
            owner_id,
            amount,
            date,
            category,
            description: None,
            kind: ExpenseKind::Shared,
            participants,
        }
    }

    /// The number of cost-sharing parties: the participants plus the owner.
    ///
    /// At least 2 for a shared expense.
    pub fn party_count(&self) -> usize {
        self.participants.len() + 1
    }
}

/// A draft for creating [Expense] instances.
///
/// Drafts carry the same fields as an expense minus the ID, which the store
/// assigns on insert. [ExpenseDraft::validate] checks the record invariants;
/// [create_expense] validates and inserts in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    /// The user recording the expense. Becomes the owner.
    pub owner_id: UserID,
    /// The amount of money spent. Must not be negative.
    pub amount: f64,
    /// When the expense happened.
    pub date: Date,
    /// The category to file the expense under.
    pub category: CategoryName,
    /// An optional text description.
    pub description: Option<String>,
    /// Whether the expense is personal or shared.
    pub kind: ExpenseKind,
    /// The users sharing the cost. Must be empty for a personal expense,
    /// non-empty and owner-free for a shared one.
    pub participants: Vec<UserID>,
}

impl ExpenseDraft {
    /// Set the description for the expense.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the draft against the expense record invariants.
    ///
    /// Note that this function does not insert the draft into the database;
    /// use [create_expense] for that.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NegativeAmount] if the amount is below zero,
    /// - [Error::MissingParticipants] if a shared draft names no participants,
    /// - [Error::UnexpectedParticipants] if a personal draft names participants,
    /// - [Error::OwnerInParticipants] if a shared draft lists its owner as a
    ///   participant.
    pub fn validate(&self) -> Result<(), Error> {
        if self.amount < 0.0 {
            return Err(Error::NegativeAmount(self.amount));
        }

        match self.kind {
            ExpenseKind::Personal if !self.participants.is_empty() => {
                Err(Error::UnexpectedParticipants)
            }
            ExpenseKind::Personal => Ok(()),
            ExpenseKind::Shared if self.participants.is_empty() => Err(Error::MissingParticipants),
            ExpenseKind::Shared if self.participants.contains(&self.owner_id) => {
                Err(Error::OwnerInParticipants)
            }
            ExpenseKind::Shared => Ok(()),
        }
    }

    /// The participant list with duplicates collapsed, keeping the first
    /// occurrence of each user.
    ///
    /// Participants are set-valued, so adding the same user twice counts once.
    fn deduped_participants(&self) -> Vec<UserID> {
        let mut participants: Vec<UserID> = Vec::with_capacity(self.participants.len());

        for &participant in &self.participants {
            if !participants.contains(&participant) {
                participants.push(participant);
            }
        }

        participants
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense and expense participant tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_expense_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL REFERENCES user(id),
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT,
                kind TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense_participant (
                expense_id INTEGER NOT NULL REFERENCES expense(id),
                user_id INTEGER NOT NULL REFERENCES user(id),
                UNIQUE(expense_id, user_id)
                )",
        (),
    )?;

    Ok(())
}

/// Create a new expense in the database from a draft.
///
/// The draft is validated first; a rejected draft writes nothing. The expense
/// row and its participant rows are committed in a single transaction.
///
/// # Errors
/// This function will return a:
/// - validation error from [ExpenseDraft::validate] if the draft breaks a
///   record invariant,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(draft: ExpenseDraft, connection: &Connection) -> Result<Expense, Error> {
    draft.validate()?;
    let participants = draft.deduped_participants();

    let tx = connection.unchecked_transaction()?;

    let mut expense = tx
        .prepare(
            "INSERT INTO expense (owner_id, amount, date, category, description, kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, owner_id, amount, date, category, description, kind",
        )?
        .query_row(
            (
                draft.owner_id.as_i64(),
                draft.amount,
                draft.date,
                draft.category.as_ref(),
                &draft.description,
                draft.kind.as_str(),
            ),
            map_expense_row,
        )?;

    let mut statement =
        tx.prepare("INSERT INTO expense_participant (expense_id, user_id) VALUES (?1, ?2)")?;

    for participant in &participants {
        statement.execute((expense.id, participant.as_i64()))?;
    }

    drop(statement);
    tx.commit()?;

    expense.participants = participants;

    Ok(expense)
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(id: DatabaseID, connection: &Connection) -> Result<Expense, Error> {
    let mut expense = connection
        .prepare(
            "SELECT id, owner_id, amount, date, category, description, kind
             FROM expense WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_expense_row)?;

    expense.participants = get_participants(id, connection)?;

    Ok(expense)
}

/// Retrieve the expenses that involve `user_id` as owner or participant,
/// newest date first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn list_expenses(user_id: UserID, connection: &Connection) -> Result<Vec<Expense>, Error> {
    let expenses = connection
        .prepare(
            "SELECT DISTINCT e.id, e.owner_id, e.amount, e.date, e.category, e.description, e.kind
             FROM expense e
             LEFT JOIN expense_participant p ON p.expense_id = e.id
             WHERE e.owner_id = :id OR p.user_id = :id
             ORDER BY e.date DESC, e.id DESC",
        )?
        .query_map(&[(":id", &user_id.as_i64())], map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::SqlError))
        .collect::<Result<Vec<Expense>, Error>>()?;

    expenses
        .into_iter()
        .map(|mut expense| {
            expense.participants = get_participants(expense.id, connection)?;
            Ok(expense)
        })
        .collect()
}

/// Delete the expense with `id` on behalf of `requester`.
///
/// Only the owner of an expense may delete it. A rejected delete leaves the
/// database unchanged.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - [Error::NotOwner] if `requester` is not the expense's owner,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_expense(
    id: DatabaseID,
    requester: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let owner_id: i64 = connection
        .prepare("SELECT owner_id FROM expense WHERE id = :id")?
        .query_row(&[(":id", &id)], |row| row.get(0))?;

    if UserID::new(owner_id) != requester {
        tracing::warn!("user {requester} attempted to delete expense {id} owned by {owner_id}");
        return Err(Error::NotOwner);
    }

    let tx = connection.unchecked_transaction()?;
    tx.execute("DELETE FROM expense_participant WHERE expense_id = ?1", (id,))?;
    tx.execute("DELETE FROM expense WHERE id = ?1", (id,))?;
    tx.commit()?;

    Ok(())
}

/// Get the total number of expenses in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_expenses(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM expense;", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|count| count as usize)
        .map_err(|error| error.into())
}

/// Get the participant IDs recorded for an expense.
fn get_participants(expense_id: DatabaseID, connection: &Connection) -> Result<Vec<UserID>, Error> {
    connection
        .prepare("SELECT user_id FROM expense_participant WHERE expense_id = :id")?
        .query_map(&[(":id", &expense_id)], |row| {
            row.get(0).map(UserID::new)
        })?
        .map(|id_result| id_result.map_err(Error::SqlError))
        .collect()
}

/// Map a database row to an Expense with an empty participant list.
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let owner_id: i64 = row.get(1)?;
    let amount = row.get(2)?;
    let date = row.get(3)?;
    let category: String = row.get(4)?;
    let description = row.get(5)?;
    let kind: String = row.get(6)?;

    let kind = match kind.as_str() {
        "personal" => ExpenseKind::Personal,
        "shared" => ExpenseKind::Shared,
        _ => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("unknown expense kind {kind:?}").into(),
            ));
        }
    };

    Ok(Expense {
        id,
        owner_id: UserID::new(owner_id),
        amount,
        date,
        category: CategoryName::new_unchecked(&category),
        description,
        kind,
        participants: Vec::new(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod expense_draft_tests {
    use time::macros::date;

    use crate::{Error, category::CategoryName, user::UserID};

    use super::Expense;

    #[test]
    fn validate_fails_on_negative_amount() {
        let draft = Expense::personal(
            UserID::new(1),
            -0.01,
            date!(2025 - 06 - 14),
            CategoryName::new_unchecked("Dining"),
        );

        assert_eq!(draft.validate(), Err(Error::NegativeAmount(-0.01)));
    }

    #[test]
    fn validate_accepts_zero_amount() {
        let draft = Expense::personal(
            UserID::new(1),
            0.0,
            date!(2025 - 06 - 14),
            CategoryName::new_unchecked("Other"),
        );

        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn validate_fails_on_shared_without_participants() {
        let draft = Expense::shared(
            UserID::new(1),
            30.0,
            date!(2025 - 06 - 14),
            CategoryName::new_unchecked("Dining"),
            vec![],
        );

        assert_eq!(draft.validate(), Err(Error::MissingParticipants));
    }

    #[test]
    fn validate_fails_on_personal_with_participants() {
        let mut draft = Expense::personal(
            UserID::new(1),
            30.0,
            date!(2025 - 06 - 14),
            CategoryName::new_unchecked("Dining"),
        );
        draft.participants = vec![UserID::new(2)];

        assert_eq!(draft.validate(), Err(Error::UnexpectedParticipants));
    }

    #[test]
    fn validate_fails_on_owner_in_participants() {
        let draft = Expense::shared(
            UserID::new(1),
            30.0,
            date!(2025 - 06 - 14),
            CategoryName::new_unchecked("Dining"),
            vec![UserID::new(2), UserID::new(1)],
        );

        assert_eq!(draft.validate(), Err(Error::OwnerInParticipants));
    }

    #[test]
    fn validate_accepts_shared_with_participants() {
        let draft = Expense::shared(
            UserID::new(1),
            30.0,
            date!(2025 - 06 - 14),
            CategoryName::new_unchecked("Dining"),
            vec![UserID::new(2), UserID::new(3)],
        )
        .description("team lunch");

        assert_eq!(draft.validate(), Ok(()));
        assert_eq!(draft.description.as_deref(), Some("team lunch"));
    }
}
