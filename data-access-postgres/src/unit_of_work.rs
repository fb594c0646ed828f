use std::sync::atomic::{AtomicU64, Ordering};

use data_access_api::StoreResult;
use sqlx::PgPool;
use tracing::{debug, error};

use crate::executor::{Executor, SqlParam};
use crate::query::PgQuery;

/// Unit of work over one Postgres transaction
///
/// Raw statements and queries created from this unit share its transaction.
/// Nothing is visible to other connections until
/// [`PgUnitOfWork::save_changes_async`] commits.
///
/// # Example
/// ```ignore
/// let unit_of_work = PgUnitOfWork::begin(&pool).await?;
/// unit_of_work
///     .execute_sql_raw("UPDATE product SET price = $1 WHERE id = $2", &[5.into(), id.into()])
///     .await?;
/// let written = unit_of_work.save_changes_async().await?;
/// ```
pub struct PgUnitOfWork {
    executor: Executor,
    rows_affected: AtomicU64,
}

impl PgUnitOfWork {
    /// Begin a transaction on `pool`
    pub async fn begin(pool: &PgPool) -> StoreResult<Self> {
        let tx = pool.begin().await?;
        debug!("Beginning transaction");
        Ok(Self::new(Executor::new(tx)))
    }

    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            rows_affected: AtomicU64::new(0),
        }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Lazy query over a raw `SELECT` inside this unit's transaction
    pub fn from_sql_raw<T>(&self, sql: impl Into<String>, params: Vec<SqlParam>) -> PgQuery<T> {
        PgQuery::new(self.executor.clone(), sql, params)
    }

    /// Execute a raw statement inside this unit's transaction
    ///
    /// # Returns
    /// * `Ok(u64)` - Rows affected by this statement
    /// * `Err(StoreError::TransactionConsumed)` - The unit was already saved or rolled back
    pub async fn execute_sql_raw(&self, sql: &str, params: &[SqlParam]) -> StoreResult<u64> {
        let affected = self.executor.execute(sql, params).await?;
        self.rows_affected.fetch_add(affected, Ordering::SeqCst);
        Ok(affected)
    }

    /// Rows affected by the statements executed since the transaction began
    pub fn pending_rows(&self) -> u64 {
        self.rows_affected.load(Ordering::SeqCst)
    }

    /// Commit the transaction
    ///
    /// # Returns
    /// * `Ok(u64)` - Rows affected by the statements executed in this unit
    /// * `Err` - The commit failed or the transaction was already consumed
    pub async fn save_changes_async(&self) -> StoreResult<u64> {
        debug!("Saving changes");
        match self.executor.commit().await {
            Ok(()) => {
                let written = self.rows_affected.swap(0, Ordering::SeqCst);
                debug!(written, "Saved changes");
                Ok(written)
            }
            Err(err) => {
                error!(error = %err, "Error in save_changes_async");
                Err(err)
            }
        }
    }

    /// Roll the transaction back, discarding every statement of this unit
    pub async fn rollback(&self) -> StoreResult<()> {
        debug!("Rolling back transaction");
        self.rows_affected.store(0, Ordering::SeqCst);
        self.executor.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use data_access_api::StoreError;
    use serial_test::serial;
    use uuid::Uuid;

    use crate::test_helper::{connect_test_pool, setup_test_context};

    use super::*;

    #[tokio::test]
    #[serial]
    #[ignore = "requires a Postgres database (DATABASE_URL)"]
    async fn test_save_commits_and_consumes() -> Result<(), Box<dyn Error + Send + Sync>> {
        let pool = connect_test_pool().await?;
        let id = Uuid::new_v4();

        let unit_of_work = PgUnitOfWork::begin(&pool).await?;
        let inserted = unit_of_work
            .execute_sql_raw(
                "INSERT INTO product (id, name, price) VALUES ($1, $2, $3)",
                &[id.into(), "committed".into(), 3i32.into()],
            )
            .await?;
        assert_eq!(inserted, 1);
        assert_eq!(unit_of_work.save_changes_async().await?, 1);
        assert!(unit_of_work.executor().is_consumed().await);

        let err = unit_of_work.execute_sql_raw("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::TransactionConsumed));

        let cleanup = PgUnitOfWork::begin(&pool).await?;
        let removed = cleanup
            .execute_sql_raw("DELETE FROM product WHERE id = $1", &[id.into()])
            .await?;
        assert_eq!(removed, 1);
        cleanup.save_changes_async().await?;
        Ok(())
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a Postgres database (DATABASE_URL)"]
    async fn test_rollback_discards_statements() -> Result<(), Box<dyn Error + Send + Sync>> {
        let id = Uuid::new_v4();
        {
            let unit_of_work = setup_test_context().await?;
            unit_of_work
                .execute_sql_raw(
                    "INSERT INTO product (id, name, price) VALUES ($1, $2, $3)",
                    &[id.into(), "rolled back".into(), 1i32.into()],
                )
                .await?;
            assert_eq!(unit_of_work.pending_rows(), 1);
            unit_of_work.rollback().await?;
            assert_eq!(unit_of_work.pending_rows(), 0);
        }

        let unit_of_work = setup_test_context().await?;
        let remaining = unit_of_work
            .execute_sql_raw("DELETE FROM product WHERE id = $1", &[id.into()])
            .await?;
        assert_eq!(remaining, 0);
        unit_of_work.rollback().await?;
        Ok(())
    }
}
