use std::{fmt, time::Duration};

/// Key a failed lookup was made with; rendered into the error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Username(String),
    Id(i32),
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::Username(username) => write!(f, "user {username}"),
            LookupKey::Id(id) => write!(f, "user with id {id}"),
        }
    }
}

/// Errors surfaced by [`UserRepository`](super::repo::UserRepository).
///
/// A missing record is not an error: lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum UserRepoError {
    /// Storage fault during a by-key lookup. The underlying fault is logged
    /// where it happens and not carried here.
    #[error("Error getting {key}")]
    DatabaseAccess { key: LookupKey },

    /// The insert ran but storage handed no row back.
    #[error("Could not create user with username {username}")]
    Creation { username: String },

    #[error("user storage failed during {operation}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl UserRepoError {
    /// True when storage rejected a write because of a unique constraint
    /// (duplicate username or email).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            UserRepoError::Storage {
                source: sqlx::Error::Database(db),
                ..
            } => db.is_unique_violation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn lookup_messages_name_the_key() {
        let by_name = UserRepoError::DatabaseAccess {
            key: LookupKey::Username("alice".into()),
        };
        assert_eq!(by_name.to_string(), "Error getting user alice");

        let by_id = UserRepoError::DatabaseAccess {
            key: LookupKey::Id(42),
        };
        assert_eq!(by_id.to_string(), "Error getting user with id 42");
        assert!(by_id.source().is_none());
    }

    #[test]
    fn creation_message_names_username() {
        let err = UserRepoError::Creation {
            username: "bob".into(),
        };
        assert_eq!(err.to_string(), "Could not create user with username bob");
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn storage_error_keeps_its_source() {
        let err = UserRepoError::Storage {
            operation: "list_all",
            source: sqlx::Error::PoolTimedOut,
        };
        assert_eq!(err.to_string(), "user storage failed during list_all");
        assert!(err.source().is_some());
        assert!(!err.is_unique_violation());
    }
}
