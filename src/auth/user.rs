//! # Login Users
//!
//! Username/password lookup against the `users` table.

use rusqlite::{params, OptionalExtension};

use super::crypto::{hash_password, validate_password, verify_against_dummy, verify_password};
use super::errors::{AuthError, AuthResult};
use crate::db::{DbError, DbPool};

/// User store backed by the shared pool
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Register a user, hashing the password
    pub async fn add_user(&self, username: &str, password: &str) -> AuthResult<i64> {
        let username = username.trim().to_string();
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidUsername(username));
        }
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let name = username.clone();
        let inserted = self
            .pool
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                    params![name, password_hash],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await;

        match inserted {
            Ok(id) => {
                tracing::info!(%username, "user added");
                Ok(id)
            }
            Err(e) if e.is_unique_violation() => Err(AuthError::UsernameTaken(username)),
            Err(e) => Err(e.into()),
        }
    }

    /// Check a username/password pair
    pub async fn verify_login(&self, username: &str, password: &str) -> AuthResult<()> {
        let name = username.trim().to_string();
        let stored: Option<String> = self
            .pool
            .run(move |conn| {
                conn.query_row(
                    "SELECT password_hash FROM users WHERE username = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()
                .map_err(DbError::from)
            })
            .await?;

        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || match stored {
            Some(hash) => verify_password(&password, &hash),
            None => {
                verify_against_dummy(&password);
                false
            }
        })
        .await
        .map_err(|e| AuthError::Database(DbError::Worker(e.to_string())))?;

        if verified {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_verify() {
        let repo = UserRepository::new(DbPool::open_in_memory().unwrap());
        repo.add_user("auditor", "s3cret-pass").await.unwrap();

        assert!(repo.verify_login("auditor", "s3cret-pass").await.is_ok());
        assert!(matches!(
            repo.verify_login("auditor", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            repo.verify_login("nobody", "s3cret-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let repo = UserRepository::new(DbPool::open_in_memory().unwrap());
        repo.add_user("auditor", "s3cret-pass").await.unwrap();

        let err = repo.add_user("auditor", "another-pass").await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken(_)));
    }

    #[tokio::test]
    async fn test_stored_hash_is_not_plaintext() {
        let pool = DbPool::open_in_memory().unwrap();
        let repo = UserRepository::new(pool.clone());
        repo.add_user("auditor", "s3cret-pass").await.unwrap();

        let stored: String = pool
            .run(|conn| {
                Ok(conn.query_row("SELECT password_hash FROM users", [], |row| row.get(0))?)
            })
            .await
            .unwrap();
        assert_ne!(stored, "s3cret-pass");
    }
}
