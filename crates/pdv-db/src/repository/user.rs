//! # User Repository
//!
//! Operators who record sales. Accounts and credentials belong to the
//! identity collaborator; this table only gives `sales.user_id` something
//! to reference.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use pdv_core::{NewUser, User, Validate};

const COLUMNS: &str = "id, name, email, created_at";

/// Repository for operator database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new operator.
    pub async fn insert(&self, input: NewUser) -> DbResult<User> {
        let user = input.into_user(generate_id(), Utc::now());
        user.validate()?;

        debug!(id = %user.id, "Inserting user");

        sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets an operator by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Deletes an operator.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such operator
    /// * `Err(DbError::ForeignKeyViolation)` - Sales still reference the operator
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
