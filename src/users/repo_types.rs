use std::fmt;

use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, Row};

/// Public user record, safe to hand to any caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,            // assigned by storage
    pub username: String,   // unique
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// User record including the password hash, for credential checks only.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct UserWithPassword {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String, // hashed, never exposed in JSON
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

pub type UserList = Vec<User>;

// `SELECT *` also returns the password column; it is simply not read here.
impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for UserWithPassword {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
        })
    }
}

impl fmt::Debug for UserWithPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserWithPassword")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish()
    }
}

impl From<UserWithPassword> for User {
    fn from(u: UserWithPassword) -> Self {
        Self {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserWithPassword {
        UserWithPassword {
            id: 7,
            username: "alice".into(),
            password: "hashed123".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            email: "a@x.com".into(),
        }
    }

    #[test]
    fn password_is_never_serialized() {
        let json = serde_json::to_string(&alice()).unwrap();
        assert!(json.contains("alice"));
        assert!(!json.contains("hashed123"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let out = format!("{:?}", alice());
        assert!(out.contains("<redacted>"));
        assert!(!out.contains("hashed123"));
    }

    #[test]
    fn narrowing_keeps_public_fields() {
        let user = User::from(alice());
        assert_eq!(
            user,
            User {
                id: 7,
                username: "alice".into(),
                first_name: "Alice".into(),
                last_name: "Smith".into(),
                email: "a@x.com".into(),
            }
        );
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@x.com");
    }
}
