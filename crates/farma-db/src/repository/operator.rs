//! # Operator Repository
//!
//! Database operations for pharmacy operators.
//!
//! Identity only: credential material and authentication belong to the
//! presentation layer. The core records who performed each sale and serves
//! the operator listing a login screen needs.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use farma_core::{Operator, Role};

/// Repository for operator database operations.
#[derive(Debug, Clone)]
pub struct OperatorRepository {
    pool: SqlitePool,
}

impl OperatorRepository {
    /// Creates a new OperatorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OperatorRepository { pool }
    }

    /// Lists all operators ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Operator>> {
        let operators: Vec<Operator> = sqlx::query_as(
            r#"
            SELECT id, name, login, role
            FROM operators
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(operators)
    }

    /// Gets an operator by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Operator>> {
        let operator: Option<Operator> = sqlx::query_as(
            r#"
            SELECT id, name, login, role
            FROM operators
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(operator)
    }

    /// Inserts a new operator and returns its id.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - login already taken
    pub async fn insert(&self, name: &str, login: &str, role: Role) -> DbResult<i64> {
        debug!(login = %login, "Inserting operator");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO operators (name, login, role, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(name)
        .bind(login)
        .bind(role)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
