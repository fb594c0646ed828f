use std::sync::Arc;

use data_access_api::{StoreError, StoreResult};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Owned bind value for raw SQL
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uuid(Uuid),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i32> for SqlParam {
    fn from(value: i32) -> Self {
        SqlParam::Int(value.into())
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Float(value)
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        SqlParam::Bool(value)
    }
}

impl From<Uuid> for SqlParam {
    fn from(value: Uuid) -> Self {
        SqlParam::Uuid(value)
    }
}

/// Bind `params` to `query` in order
pub(crate) fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Text(value) => query.bind(value.clone()),
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::Float(value) => query.bind(*value),
            SqlParam::Bool(value) => query.bind(*value),
            SqlParam::Uuid(value) => query.bind(*value),
        };
    }
    query
}

/// Shared handle over one database transaction
///
/// Every query sent through an executor runs inside the same transaction.
/// Once the transaction is committed or rolled back, further use fails with
/// [`StoreError::TransactionConsumed`].
#[derive(Clone)]
pub struct Executor {
    pub tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl Executor {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub async fn is_consumed(&self) -> bool {
        self.tx.lock().await.is_none()
    }

    pub(crate) async fn fetch_all(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> StoreResult<Vec<PgRow>> {
        let mut tx = self.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        Ok(bind_params(sqlx::query(sql), params)
            .fetch_all(&mut **transaction)
            .await?)
    }

    pub(crate) async fn fetch_one(&self, sql: &str, params: &[SqlParam]) -> StoreResult<PgRow> {
        let mut tx = self.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        Ok(bind_params(sqlx::query(sql), params)
            .fetch_one(&mut **transaction)
            .await?)
    }

    /// Execute a statement, returning the number of rows affected
    pub async fn execute(&self, sql: &str, params: &[SqlParam]) -> StoreResult<u64> {
        let mut tx = self.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let result = bind_params(sqlx::query(sql), params)
            .execute(&mut **transaction)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn commit(&self) -> StoreResult<()> {
        let transaction = self.tx.lock().await.take().ok_or(StoreError::TransactionConsumed)?;
        transaction.commit().await?;
        Ok(())
    }

    pub async fn rollback(&self) -> StoreResult<()> {
        let transaction = self.tx.lock().await.take().ok_or(StoreError::TransactionConsumed)?;
        transaction.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_values() {
        let id = Uuid::new_v4();
        let params: Vec<SqlParam> = vec![
            "name".into(),
            7i32.into(),
            1.5f64.into(),
            true.into(),
            id.into(),
        ];
        assert_eq!(
            params,
            vec![
                SqlParam::Text("name".to_string()),
                SqlParam::Int(7),
                SqlParam::Float(1.5),
                SqlParam::Bool(true),
                SqlParam::Uuid(id),
            ]
        );
    }
}
