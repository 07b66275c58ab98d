//! Resolution of participant email addresses to user accounts.
//!
//! Splitting an expense starts from email addresses typed by the owner; this
//! module turns them into user IDs through the directory. Lookup is a pure
//! transformation over directory results: any retry or debounce policy while
//! the owner is still typing belongs to the caller.

use rusqlite::Connection;

use crate::{
    Error,
    user::{self, User, UserID},
};

/// The outcome of resolving a list of candidate participant emails.
///
/// Resolution never stops early: every candidate is looked up, hits collect
/// into `resolved` and misses into `missing`, so the caller can report all
/// unknown addresses at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantResolution {
    /// The users that were found, in first-mention order.
    ///
    /// Duplicate mentions of the same user collapse into one entry.
    pub resolved: Vec<User>,
    /// The email addresses that matched no user, in input order.
    pub missing: Vec<String>,
}

impl ParticipantResolution {
    /// Whether every candidate email resolved to a user.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// The IDs of the resolved users, for building an expense draft or group.
    ///
    /// Creation flows must not proceed with a partial participant set, so
    /// this rejects incomplete resolutions outright.
    ///
    /// # Errors
    /// This function will return an [Error::ParticipantNotFound] carrying the
    /// first unresolved email if any candidate did not resolve. Callers that
    /// want the full list should inspect [ParticipantResolution::missing]
    /// before calling this.
    pub fn require_complete(mut self) -> Result<Vec<UserID>, Error> {
        if self.missing.is_empty() {
            Ok(self.resolved.into_iter().map(|user| user.id).collect())
        } else {
            Err(Error::ParticipantNotFound(self.missing.remove(0)))
        }
    }
}

/// Resolve each candidate email to a user through the directory.
///
/// Lookups are case-insensitive. An email that matches no user is recorded
/// in the result's `missing` list and does not abort the remaining lookups.
///
/// # Errors
/// This function will return an [Error::SqlError] if a directory lookup
/// fails for a reason other than the user not existing.
pub fn resolve_participants(
    emails: &[String],
    connection: &Connection,
) -> Result<ParticipantResolution, Error> {
    let mut resolution = ParticipantResolution::default();

    for email in emails {
        match user::find_user_by_email(email, connection) {
            Ok(found) => {
                if !resolution.resolved.iter().any(|user| user.id == found.id) {
                    resolution.resolved.push(found);
                }
            }
            Err(Error::NotFound) => {
                tracing::debug!("no user found for participant email {email}");
                resolution.missing.push(email.clone());
            }
            Err(error) => return Err(error),
        }
    }

    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        user::{User, create_user},
    };

    use super::resolve_participants;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_users(conn: &Connection) -> (User, User) {
        let bob = create_user("Bob", "bob@example.com", "en", conn).unwrap();
        let carol = create_user("Carol", "carol@example.com", "en", conn).unwrap();

        (bob, carol)
    }

    fn emails(addresses: &[&str]) -> Vec<String> {
        addresses.iter().map(|email| email.to_string()).collect()
    }

    #[test]
    fn resolves_emails_in_order() {
        let conn = get_test_connection();
        let (bob, carol) = create_test_users(&conn);

        let resolution =
            resolve_participants(&emails(&["carol@example.com", "bob@example.com"]), &conn)
                .expect("Could not resolve participants");

        assert!(resolution.is_complete());
        assert_eq!(resolution.resolved, vec![carol, bob]);
    }

    #[test]
    fn lookup_ignores_case() {
        let conn = get_test_connection();
        let (bob, _) = create_test_users(&conn);

        let resolution = resolve_participants(&emails(&["BOB@Example.Com"]), &conn)
            .expect("Could not resolve participants");

        assert_eq!(resolution.resolved, vec![bob]);
    }

    #[test]
    fn duplicate_mentions_collapse() {
        let conn = get_test_connection();
        let (bob, _) = create_test_users(&conn);

        let resolution = resolve_participants(
            &emails(&["bob@example.com", "BOB@EXAMPLE.COM", "bob@example.com"]),
            &conn,
        )
        .expect("Could not resolve participants");

        assert_eq!(
            resolution.resolved,
            vec![bob],
            "the same user mentioned several times should resolve once"
        );
    }

    #[test]
    fn misses_are_collected_without_aborting() {
        let conn = get_test_connection();
        let (bob, carol) = create_test_users(&conn);

        let resolution = resolve_participants(
            &emails(&[
                "bob@example.com",
                "nobody@example.com",
                "carol@example.com",
                "ghost@example.com",
            ]),
            &conn,
        )
        .expect("Could not resolve participants");

        assert!(!resolution.is_complete());
        assert_eq!(
            resolution.resolved,
            vec![bob, carol],
            "emails after a miss should still be resolved"
        );
        assert_eq!(
            resolution.missing,
            vec!["nobody@example.com", "ghost@example.com"]
        );
    }

    #[test]
    fn require_complete_returns_ids() {
        let conn = get_test_connection();
        let (bob, carol) = create_test_users(&conn);

        let participant_ids =
            resolve_participants(&emails(&["bob@example.com", "carol@example.com"]), &conn)
                .unwrap()
                .require_complete()
                .expect("Resolution should be complete");

        assert_eq!(participant_ids, vec![bob.id, carol.id]);
    }

    #[test]
    fn require_complete_rejects_unresolved_emails() {
        let conn = get_test_connection();
        create_test_users(&conn);

        let result = resolve_participants(&emails(&["nobody@example.com"]), &conn)
            .unwrap()
            .require_complete();

        assert_eq!(
            result,
            Err(Error::ParticipantNotFound("nobody@example.com".to_string()))
        );
    }
}
