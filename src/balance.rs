//! Share and balance computation for shared expenses.
//!
//! [user_share] answers "what is this one expense worth to this user" as a
//! payment-outlay view: the owner is on the hook for the full amount as the
//! payer of record, while each participant owes an equal fraction of it.
//! [aggregate_shared_balance] folds that view over a whole expense history
//! into the user's net position.

use serde::Serialize;

use crate::{
    Error,
    expense::{Expense, ExpenseKind},
    user::UserID,
};

/// The number of minor currency units (cents) in one major unit.
const CENTS_PER_UNIT: f64 = 100.0;

/// Round an amount to the nearest cent, halves rounding up.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * CENTS_PER_UNIT).round() / CENTS_PER_UNIT
}

/// Compute `viewer`'s monetary responsibility for a single expense.
///
/// - For a personal expense, the owner is responsible for the full amount.
/// - For a shared expense, the owner is responsible for the full amount (the
///   payment outlay, not the net cost), and each participant for
///   `amount / (participants + 1)` rounded to the nearest cent.
///
/// Rounding is applied independently per call; there is no running remainder
/// correction across calls.
///
/// # Errors
/// This function will return an [Error::UnrelatedUser] if `viewer` is neither
/// the owner nor a participant of `expense`.
pub fn user_share(expense: &Expense, viewer: UserID) -> Result<f64, Error> {
    if expense.owner_id == viewer {
        return Ok(expense.amount);
    }

    if expense.kind == ExpenseKind::Shared && expense.participants.contains(&viewer) {
        return Ok(participant_share(expense));
    }

    Err(Error::UnrelatedUser(viewer, expense.id))
}

/// The equal fraction of a shared expense owed by each non-owner party.
fn participant_share(expense: &Expense) -> f64 {
    round_to_cents(expense.amount / expense.party_count() as f64)
}

/// A user's financial position across a set of shared expenses.
///
/// Produced by [aggregate_shared_balance]. All three totals cover shared
/// expenses only; personal expenses never appear in a balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SharedBalance {
    /// The sum of the user's share over every shared expense involving them:
    /// always equal to `paid_as_owner + owed_as_participant`.
    pub total_share_responsibility: f64,
    /// The full amounts of the shared expenses the user paid for as owner.
    pub paid_as_owner: f64,
    /// The user's fractional shares of shared expenses owned by other users.
    pub owed_as_participant: f64,
}

/// Aggregate `user`'s position over `expenses`.
///
/// Personal expenses and shared expenses that do not involve `user` are
/// skipped. The result depends only on the contents of `expenses`, not their
/// order; an empty input yields an all-zero balance.
pub fn aggregate_shared_balance(expenses: &[Expense], user: UserID) -> SharedBalance {
    let mut balance = SharedBalance::default();

    for expense in expenses {
        if expense.kind != ExpenseKind::Shared {
            continue;
        }

        if expense.owner_id == user {
            balance.paid_as_owner += expense.amount;
        } else if expense.participants.contains(&user) {
            balance.owed_as_participant += participant_share(expense);
        }
    }

    balance.total_share_responsibility = balance.paid_as_owner + balance.owed_as_participant;

    balance
}


#[cfg(test)]
mod aggregate_tests {
    use time::macros::date;

    use crate::{
        category::CategoryName,
        expense::{Expense, ExpenseKind},
        user::UserID,
    };

    use super::{SharedBalance, aggregate_shared_balance};

    fn shared_expense(id: i64, owner: i64, amount: f64, participants: &[i64]) -> Expense {
        Expense {
            id,
            owner_id: UserID::new(owner),
            amount,
            date: date!(2025 - 06 - 14),
            category: CategoryName::new_unchecked("Dining"),
            description: None,
            kind: ExpenseKind::Shared,
            participants: participants.iter().copied().map(UserID::new).collect(),
        }
    }

    fn personal_expense(id: i64, owner: i64, amount: f64) -> Expense {
        Expense {
            id,
            owner_id: UserID::new(owner),
            amount,
            date: date!(2025 - 06 - 14),
            category: CategoryName::new_unchecked("Rent"),
            description: None,
            kind: ExpenseKind::Personal,
            participants: vec![],
        }
    }

    #[test]
    fn empty_input_yields_zero_balance() {
        let balance = aggregate_shared_balance(&[], UserID::new(1));

        assert_eq!(balance, SharedBalance::default());
    }

    #[test]
    fn owner_and_participant_sides_are_split() {
        let expenses = vec![
            shared_expense(1, 1, 90.0, &[2, 3]),
            shared_expense(2, 2, 30.0, &[1]),
        ];

        let balance = aggregate_shared_balance(&expenses, UserID::new(1));

        assert_eq!(balance.paid_as_owner, 90.0);
        assert_eq!(balance.owed_as_participant, 15.0);
        assert_eq!(balance.total_share_responsibility, 105.0);
    }

    #[test]
    fn participant_view_of_single_expense() {
        let expenses = vec![shared_expense(1, 1, 90.0, &[2, 3])];

        let balance = aggregate_shared_balance(&expenses, UserID::new(2));

        assert_eq!(balance.paid_as_owner, 0.0);
        assert_eq!(balance.owed_as_participant, 30.0);
        assert_eq!(balance.total_share_responsibility, 30.0);
    }

    #[test]
    fn personal_expenses_are_ignored() {
        let expenses = vec![
            personal_expense(1, 1, 500.0),
            shared_expense(2, 1, 60.0, &[2]),
        ];

        let balance = aggregate_shared_balance(&expenses, UserID::new(1));

        assert_eq!(balance.paid_as_owner, 60.0);
        assert_eq!(balance.total_share_responsibility, 60.0);
    }

    #[test]
    fn unrelated_shared_expenses_are_ignored() {
        let expenses = vec![shared_expense(1, 2, 100.0, &[3])];

        let balance = aggregate_shared_balance(&expenses, UserID::new(1));

        assert_eq!(balance, SharedBalance::default());
    }

    #[test]
    fn result_does_not_depend_on_input_order() {
        let mut expenses = vec![
            shared_expense(1, 1, 90.0, &[2, 3]),
            shared_expense(2, 2, 10.0, &[1, 3]),
            shared_expense(3, 3, 45.5, &[1]),
        ];

        let forwards = aggregate_shared_balance(&expenses, UserID::new(1));
        expenses.reverse();
        let backwards = aggregate_shared_balance(&expenses, UserID::new(1));

        assert_eq!(forwards, backwards);
    }

    #[test]
    fn total_is_paid_plus_owed() {
        let expenses = vec![
            shared_expense(1, 1, 90.0, &[2, 3]),
            shared_expense(2, 2, 10.0, &[1, 3]),
            shared_expense(3, 3, 45.5, &[1]),
            personal_expense(4, 1, 12.0),
        ];

        for user in [1, 2, 3] {
            let balance = aggregate_shared_balance(&expenses, UserID::new(user));

            assert_eq!(
                balance.total_share_responsibility,
                balance.paid_as_owner + balance.owed_as_participant,
                "total/paid/owed mismatch for user {user}"
            );
        }
    }
}
