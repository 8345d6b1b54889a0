//! Database transaction utilities
//!
//! Multi-statement operations (deleting a record together with its comments) run inside a
//! `TransactionGuard` so they are all-or-nothing.

use boom_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use std::ops::{Deref, DerefMut};

/// A transaction tagged with the operation it belongs to
///
/// Dropping the guard without calling `commit` rolls the transaction back (sqlx does this
/// when the connection returns to the pool), so an early `?` return leaves no partial write.
///
/// # Example
///
/// ```ignore
/// use boom_db::TransactionGuard;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), boom_core::AppError> {
///     let mut tx = TransactionGuard::begin(pool).await?;
///     sqlx::query("DELETE FROM video_comments WHERE video_id = $1")
///         .bind(uuid::Uuid::nil())
///         .execute(&mut **tx)
///         .await?;
///     tx.commit().await
/// }
/// ```
pub struct TransactionGuard<'a> {
    transaction: Transaction<'a, Postgres>,
    operation: &'static str,
}

impl<'a> TransactionGuard<'a> {
    pub async fn begin(pool: &'a PgPool) -> Result<Self, AppError> {
        Self::begin_named(pool, "unnamed").await
    }

    /// Begin a transaction tagged with the operation it belongs to, for logs
    pub async fn begin_named(pool: &'a PgPool, operation: &'static str) -> Result<Self, AppError> {
        let transaction = pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, operation, "Failed to begin database transaction");
            AppError::Database(e)
        })?;

        Ok(Self {
            transaction,
            operation,
        })
    }

    pub async fn commit(self) -> Result<(), AppError> {
        let operation = self.operation;
        self.transaction.commit().await.map_err(|e| {
            tracing::error!(error = %e, operation, "Failed to commit database transaction");
            AppError::Database(e)
        })
    }

    pub async fn rollback(self) -> Result<(), AppError> {
        let operation = self.operation;
        self.transaction.rollback().await.map_err(|e| {
            tracing::warn!(error = %e, operation, "Failed to roll back database transaction");
            AppError::Database(e)
        })
    }
}

impl<'a> Deref for TransactionGuard<'a> {
    type Target = Transaction<'a, Postgres>;

    fn deref(&self) -> &Self::Target {
        &self.transaction
    }
}

impl<'a> DerefMut for TransactionGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.transaction
    }
}
