//! Database setup for the expense store.

use rusqlite::Connection;

use crate::{expense, group, user};

/// Create the application's tables if they do not exist.
///
/// Also enables foreign key enforcement for the connection.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    user::create_user_table(connection)?;
    expense::create_expense_tables(connection)?;
    group::create_group_tables(connection)?;

    Ok(())
}
