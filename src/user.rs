//! Code for creating the user table and looking up users.
//!
//! Users are owned by the external registration/auth layer; this module is
//! the directory the engine reads them through, most importantly the
//! case-insensitive lookup by email used when resolving participants.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The language preference assigned to users that do not specify one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A user of the application.
///
/// The engine treats users as immutable values read through the directory
/// functions below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email address, unique across users.
    ///
    /// Lookups by email are case-insensitive.
    pub email: String,
    /// The user's preferred language tag, e.g. "en".
    ///
    /// Localization itself happens in the presentation layer; the directory
    /// only carries the preference.
    pub language: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL COLLATE NOCASE UNIQUE,
                language TEXT NOT NULL DEFAULT 'en'
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateEmail] if `email` is already registered (compared
///   case-insensitively),
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    name: &str,
    email: &str,
    language: &str,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(
            "INSERT INTO user (name, email, language)
             VALUES (?1, ?2, ?3)
             RETURNING id, name, email, language",
        )?
        .query_row((name, email, language), map_user_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 2067 => {
                Error::DuplicateEmail
            }
            error => error.into(),
        })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name, email, language FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// The comparison is case-insensitive, so "ALICE@EXAMPLE.COM" finds the user
/// registered as "alice@example.com".
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no user is registered with `email`,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn find_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name, email, language FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|count| count as usize)
        .map_err(|error| error.into())
}

/// Map a database row to a User.
fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let name = row.get(1)?;
    let email = row.get(2)?;
    let language = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        name,
        email,
        language,
    })
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, user::DEFAULT_LANGUAGE};

    use super::{count_users, create_user, find_user_by_email, get_user_by_id};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_get_user() {
        let conn = get_test_connection();

        let created = create_user("Alice", "alice@example.com", DEFAULT_LANGUAGE, &conn)
            .expect("Could not create user");

        let got = get_user_by_id(created.id, &conn).expect("Could not get user");
        assert_eq!(created, got);
        assert_eq!(got.name, "Alice");
        assert_eq!(got.email, "alice@example.com");
        assert_eq!(got.language, "en");
    }

    #[test]
    fn create_fails_on_duplicate_email() {
        let conn = get_test_connection();
        create_user("Alice", "alice@example.com", "en", &conn).expect("Could not create user");

        let duplicate = create_user("Impostor", "alice@example.com", "en", &conn);

        assert_eq!(duplicate, Err(Error::DuplicateEmail));
    }

    #[test]
    fn create_fails_on_duplicate_email_ignoring_case() {
        let conn = get_test_connection();
        create_user("Alice", "alice@example.com", "en", &conn).expect("Could not create user");

        let duplicate = create_user("Impostor", "ALICE@EXAMPLE.COM", "en", &conn);

        assert_eq!(duplicate, Err(Error::DuplicateEmail));
    }

    #[test]
    fn find_by_email_ignores_case() {
        let conn = get_test_connection();
        let want = create_user("Alice", "alice@example.com", "en", &conn).unwrap();

        let got = find_user_by_email("Alice@Example.com", &conn).expect("Could not find user");

        assert_eq!(want, got);
    }

    #[test]
    fn find_by_email_fails_on_unknown_email() {
        let conn = get_test_connection();

        let result = find_user_by_email("nobody@example.com", &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_fails_on_invalid_id() {
        let conn = get_test_connection();
        let user = create_user("Alice", "alice@example.com", "en", &conn).unwrap();

        let result = get_user_by_id(crate::UserID::new(user.id.as_i64() + 42), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        create_user("Alice", "alice@example.com", "en", &conn).unwrap();
        create_user("Bob", "bob@example.com", "es", &conn).unwrap();

        let got_count = count_users(&conn).expect("Could not get count");

        assert_eq!(got_count, 2);
    }
}
