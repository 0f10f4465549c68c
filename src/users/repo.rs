use std::{fmt, future::Future, time::Duration};

use sqlx::PgPool;
use tracing::{debug, error, instrument};

use crate::users::{
    error::{LookupKey, UserRepoError},
    repo_types::{User, UserList, UserWithPassword},
};

/// Queries for the `users` table.
///
/// Holds only a handle to the shared pool. Each call checks out one
/// connection, runs one statement and hands the connection back when the
/// guard drops, whether the call succeeded, failed, timed out or was
/// cancelled by dropping its future.
#[derive(Clone)]
pub struct UserRepository {
    db: PgPool,
    query_timeout: Duration,
}

/// What went wrong below the repository, before it is mapped to a
/// [`UserRepoError`].
enum Fault {
    Db(sqlx::Error),
    Elapsed(Duration),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Db(e) => write!(f, "{e}"),
            Fault::Elapsed(after) => write!(f, "timed out after {after:?}"),
        }
    }
}

impl Fault {
    fn into_repo_error(self, operation: &'static str) -> UserRepoError {
        match self {
            Fault::Db(source) => UserRepoError::Storage { operation, source },
            Fault::Elapsed(after) => UserRepoError::Timeout { operation, after },
        }
    }
}

impl UserRepository {
    pub fn new(db: PgPool, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }

    /// Same pool, different time budget per call.
    pub fn with_timeout(&self, query_timeout: Duration) -> Self {
        Self {
            db: self.db.clone(),
            query_timeout,
        }
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, Fault>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(res) => res.map_err(Fault::Db),
            Err(_) => Err(Fault::Elapsed(self.query_timeout)),
        }
    }

    /// Find a user by username, password hash included.
    #[instrument(skip(self))]
    pub async fn get_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserWithPassword>, UserRepoError> {
        let fetched = self
            .bounded(async {
                let mut conn = self.db.acquire().await?;
                sqlx::query_as::<_, UserWithPassword>(
                    r#"
                    SELECT *
                    FROM users
                    WHERE username = $1
                    "#,
                )
                .bind(username)
                .fetch_optional(&mut *conn)
                .await
            })
            .await;

        fetched.map_err(|e| {
            error!(error = %e, %username, "get_by_username failed");
            UserRepoError::DatabaseAccess {
                key: LookupKey::Username(username.to_owned()),
            }
        })
    }

    /// Find a user by id, password hash included.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i32) -> Result<Option<UserWithPassword>, UserRepoError> {
        let fetched = self
            .bounded(async {
                let mut conn = self.db.acquire().await?;
                sqlx::query_as::<_, UserWithPassword>(
                    r#"
                    SELECT *
                    FROM users
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
            })
            .await;

        fetched.map_err(|e| {
            error!(error = %e, user_id = id, "get_by_id failed");
            UserRepoError::DatabaseAccess {
                key: LookupKey::Id(id),
            }
        })
    }

    /// Find a user by id, public fields only.
    ///
    /// Runs its own query rather than narrowing [`Self::get_by_id`].
    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>, UserRepoError> {
        let fetched = self
            .bounded(async {
                let mut conn = self.db.acquire().await?;
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT *
                    FROM users
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
            })
            .await;

        fetched.map_err(|e| {
            error!(error = %e, user_id = id, "get_user_by_id failed");
            UserRepoError::DatabaseAccess {
                key: LookupKey::Id(id),
            }
        })
    }

    /// Insert a user and return the stored row, id included.
    ///
    /// No validation happens here; unique and not-null constraints are left
    /// to the table and come back as [`UserRepoError::Storage`].
    #[instrument(skip(self, hashed_password))]
    pub async fn create_user(
        &self,
        username: &str,
        hashed_password: &str,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<UserWithPassword, UserRepoError> {
        let inserted = self
            .bounded(async {
                let mut conn = self.db.acquire().await?;
                sqlx::query_as::<_, UserWithPassword>(
                    r#"
                    INSERT INTO users (username, password, first_name, last_name, email)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(username)
                .bind(hashed_password)
                .bind(first_name)
                .bind(last_name)
                .bind(email)
                .fetch_optional(&mut *conn)
                .await
            })
            .await
            .map_err(|e| e.into_repo_error("create_user"))?;

        let user = inserted.ok_or_else(|| {
            error!(%username, "insert returned no row");
            UserRepoError::Creation {
                username: username.to_owned(),
            }
        })?;

        debug!(user_id = user.id, %username, "user created");
        Ok(user)
    }

    /// Every user, public fields only, in whatever order storage returns.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<UserList, UserRepoError> {
        let users = self
            .bounded(async {
                let mut conn = self.db.acquire().await?;
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT *
                    FROM users
                    "#,
                )
                .fetch_all(&mut *conn)
                .await
            })
            .await
            .map_err(|e| e.into_repo_error("list_all"))?;

        debug!(count = users.len(), "users listed");
        Ok(users)
    }
}
