//! Spendshare is a library for recording personal and shared expenses and
//! working out who owes what.
//!
//! An expense is either wholly owned by one user or split evenly between its
//! owner and a set of participants. On top of the expense records the crate
//! provides:
//!
//! - per-user share and balance computation ([balance]),
//! - month and category spending rollups ([dashboard]),
//! - filtered and sorted list views ([query]),
//! - resolution of participant email addresses to users ([participant]),
//! - reusable groups of co-spenders ([group]).
//!
//! All of the above are pure functions over in-memory expense collections.
//! Persistence is a thin SQLite layer ([db], plus the database sections of
//! [expense], [user], and [group]); callers that bring their own storage can
//! ignore it and construct the models directly.

#![warn(missing_docs)]

pub mod balance;
pub mod category;
pub mod dashboard;
mod database_id;
pub mod db;
pub mod expense;
pub mod group;
pub mod participant;
pub mod query;
pub mod user;

pub use database_id::DatabaseID;
pub use db::initialize as initialize_db;
pub use user::{User, UserID};

/// The errors that may occur in the engine.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A draft expense had a negative amount.
    ///
    /// Negative amounts are rejected outright, never clamped to zero.
    #[error("{0} is a negative amount, which is not allowed for an expense")]
    NegativeAmount(f64),

    /// A draft shared expense named no participants.
    ///
    /// A shared expense must have at least two cost-sharing parties: the
    /// owner plus one or more participants.
    #[error("a shared expense must name at least one participant")]
    MissingParticipants,

    /// A draft personal expense named participants.
    #[error("a personal expense cannot name participants")]
    UnexpectedParticipants,

    /// A draft shared expense listed its owner as a participant.
    ///
    /// The owner is an implicit cost-sharing party and must not appear in
    /// the participant list.
    #[error("the owner cannot be listed as a participant of their own expense")]
    OwnerInParticipants,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used to create a shared group name.
    #[error("Group name cannot be empty")]
    EmptyGroupName,

    /// An email address used to resolve a participant matched no user.
    ///
    /// Resolution does not stop at the first unknown address; see
    /// [participant::ParticipantResolution] for the full list of misses.
    #[error("no user found for the email address \"{0}\"")]
    ParticipantNotFound(String),

    /// The email address used to create a user is already registered.
    ///
    /// Emails are compared case-insensitively.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// A delete was attempted by someone other than the expense's owner.
    ///
    /// The store is left unchanged.
    #[error("only the owner of an expense may delete it")]
    NotOwner,

    /// The requested resource could not be found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A share was requested for a user who is neither the owner nor a
    /// participant of the expense.
    #[error("user {0} is neither the owner nor a participant of expense {1}")]
    UnrelatedUser(UserID, DatabaseID),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
