//! Test helper module for transaction-based test isolation
//!
//! Tests run inside a transaction they roll back themselves, so nothing
//! written during a test outlives it.

use std::error::Error;

use sqlx::PgPool;

use crate::config::PostgresConfig;
use crate::unit_of_work::PgUnitOfWork;

/// Connect to the test database and apply the migrations
pub async fn connect_test_pool() -> Result<PgPool, Box<dyn Error + Send + Sync>> {
    let config = PostgresConfig {
        max_connections: 1,
        ..PostgresConfig::from_env()
    };
    let pool = config.connect().await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// Setup a unit of work over a fresh transaction
///
/// # Example
///
/// ```ignore
/// #[tokio::test]
/// async fn test_example() -> Result<(), Box<dyn Error + Send + Sync>> {
///     let unit_of_work = setup_test_context().await?;
///     // Perform test operations...
///     unit_of_work.rollback().await?;
///     Ok(())
/// }
/// ```
pub async fn setup_test_context() -> Result<PgUnitOfWork, Box<dyn Error + Send + Sync>> {
    let pool = connect_test_pool().await?;
    Ok(PgUnitOfWork::begin(&pool).await?)
}
