//! Shared groups: named sets of users who repeatedly split costs.
//!
//! A group is a convenience label used when composing a shared expense's
//! participant list. It holds no balances of its own. Groups are append-only:
//! they can be created and listed, nothing else.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, database_id::DatabaseID, participant::resolve_participants, user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// A named set of users for composing shared expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedGroup {
    /// The ID of the group.
    pub id: DatabaseID,
    /// The group's display name, e.g. "Roommates" or "Ski Trip".
    pub name: String,
    /// The user who created the group.
    pub creator_id: UserID,
    /// The members of the group. The creator is always included, first.
    pub members: Vec<UserID>,
    /// When the group was created.
    pub created_at: OffsetDateTime,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the shared group and group member tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_group_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS shared_group (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                creator_id INTEGER NOT NULL REFERENCES user(id),
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS group_member (
                group_id INTEGER NOT NULL REFERENCES shared_group(id),
                user_id INTEGER NOT NULL REFERENCES user(id),
                UNIQUE(group_id, user_id)
                )",
        (),
    )?;

    Ok(())
}

/// Create a new shared group from member email addresses.
///
/// The member emails are resolved through the directory; the whole operation
/// is rejected if any of them is unknown, writing nothing. The creator is
/// always a member and need not be listed (listing them is harmless).
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyGroupName] if `name` is blank,
/// - [Error::ParticipantNotFound] if a member email matches no user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_group(
    name: &str,
    member_emails: &[String],
    creator: UserID,
    connection: &Connection,
) -> Result<SharedGroup, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyGroupName);
    }

    let member_ids = resolve_participants(member_emails, connection)?.require_complete()?;

    let mut members = vec![creator];
    for member in member_ids {
        if !members.contains(&member) {
            members.push(member);
        }
    }

    // Whole-second precision so the value round-trips through the database
    // text encoding unchanged.
    let created_at = OffsetDateTime::now_utc().replace_nanosecond(0).unwrap();

    let tx = connection.unchecked_transaction()?;

    let id: DatabaseID = tx
        .prepare(
            "INSERT INTO shared_group (name, creator_id, created_at)
             VALUES (?1, ?2, ?3)
             RETURNING id",
        )?
        .query_row((name, creator.as_i64(), created_at), |row| row.get(0))?;

    let mut statement =
        tx.prepare("INSERT INTO group_member (group_id, user_id) VALUES (?1, ?2)")?;

    for member in &members {
        statement.execute((id, member.as_i64()))?;
    }

    drop(statement);
    tx.commit()?;

    tracing::info!("user {creator} created group {id} with {} members", members.len());

    Ok(SharedGroup {
        id,
        name: name.to_string(),
        creator_id: creator,
        members,
        created_at,
    })
}

/// Retrieve the groups that `user_id` is a member of, most recently created
/// first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn list_groups(user_id: UserID, connection: &Connection) -> Result<Vec<SharedGroup>, Error> {
    let groups = connection
        .prepare(
            "SELECT g.id, g.name, g.creator_id, g.created_at
             FROM shared_group g
             JOIN group_member m ON m.group_id = g.id
             WHERE m.user_id = :id
             ORDER BY g.id DESC",
        )?
        .query_map(&[(":id", &user_id.as_i64())], map_group_row)?
        .map(|group_result| group_result.map_err(Error::SqlError))
        .collect::<Result<Vec<SharedGroup>, Error>>()?;

    groups
        .into_iter()
        .map(|mut group| {
            group.members = get_members(group.id, connection)?;
            Ok(group)
        })
        .collect()
}

/// Get the member IDs recorded for a group, creator first.
fn get_members(group_id: DatabaseID, connection: &Connection) -> Result<Vec<UserID>, Error> {
    connection
        .prepare("SELECT user_id FROM group_member WHERE group_id = :id")?
        .query_map(&[(":id", &group_id)], |row| row.get(0).map(UserID::new))?
        .map(|id_result| id_result.map_err(Error::SqlError))
        .collect()
}

/// Map a database row to a SharedGroup with an empty member list.
fn map_group_row(row: &Row) -> Result<SharedGroup, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let creator_id: i64 = row.get(2)?;
    let created_at = row.get(3)?;

    Ok(SharedGroup {
        id,
        name,
        creator_id: UserID::new(creator_id),
        members: Vec::new(),
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================
