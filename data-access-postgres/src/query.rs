use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use data_access_api::{StoreError, StoreResult};
use data_access_db::pagination::{AsyncQueryable, PageWindow};
use sqlx::postgres::PgRow;

use crate::executor::{Executor, SqlParam};
use crate::utils::{get_count, TryFromRow};

/// Raw SQL source paged by wrapping it in a sub-select.
///
/// The wrapped statement must be a single `SELECT`. Postgres does not keep an
/// `ORDER BY` of the sub-select once the outer `LIMIT`/`OFFSET` is applied, so
/// pages only have a stable order when one is set with [`PgQuery::order_by`].
///
/// # Example
/// ```ignore
/// let products = unit_of_work
///     .from_sql_raw::<ProductRow>(
///         "SELECT * FROM product WHERE price > $1",
///         vec![SqlParam::Int(10)],
///     )
///     .order_by("price, id");
/// let page = products.to_paged_list_async(20, 0).await?;
/// ```
pub struct PgQuery<T> {
    executor: Executor,
    statement: PagedSql,
    _row: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for PgQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgQuery").field("statement", &self.statement).finish()
    }
}

impl<T> PgQuery<T> {
    pub fn new(executor: Executor, sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            executor,
            statement: PagedSql::new(sql.into(), params),
            _row: PhantomData,
        }
    }

    /// Order the rows of the outer query by `clause`
    ///
    /// `clause` is inserted as written after `ORDER BY` and may only name
    /// columns of the wrapped statement. It is trusted SQL, never user input.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.statement.order = Some(clause.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.statement.sql
    }
}

/// A statement plus its binds, rewritten for counting and windowed fetching
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PagedSql {
    sql: String,
    params: Vec<SqlParam>,
    order: Option<String>,
}

impl PagedSql {
    fn new(sql: String, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.trim().trim_end_matches(';').trim_end().to_string(),
            params,
            order: None,
        }
    }

    fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM ({}) AS paged_source", self.sql)
    }

    /// Every row, in the outer order when one is set
    fn select_sql(&self) -> String {
        match &self.order {
            Some(order) => format!(
                "SELECT * FROM ({}) AS paged_source ORDER BY {}",
                self.sql,
                order
            ),
            None => self.sql.clone(),
        }
    }

    /// Limit and offset take the two placeholders after the statement's own
    fn fetch_sql(&self) -> String {
        let next = self.params.len() + 1;
        let order = self
            .order
            .as_ref()
            .map(|order| format!(" ORDER BY {order}"))
            .unwrap_or_default();
        format!(
            "SELECT * FROM ({}) AS paged_source{} LIMIT ${} OFFSET ${}",
            self.sql,
            order,
            next,
            next + 1
        )
    }

    fn window_params(&self, window: PageWindow) -> Vec<SqlParam> {
        let mut params = self.params.clone();
        params.push(SqlParam::Int(i64::try_from(window.take).unwrap_or(i64::MAX)));
        params.push(SqlParam::Int(i64::try_from(window.skip).unwrap_or(i64::MAX)));
        params
    }
}

impl<T> PgQuery<T>
where
    T: TryFromRow<PgRow> + Send + 'static,
{
    fn map_rows(rows: &[PgRow]) -> StoreResult<Vec<T>> {
        rows.iter()
            .map(|row| T::try_from_row(row).map_err(StoreError::RowMapping))
            .collect()
    }

    /// Every row of the statement
    pub async fn to_vec_async(&self) -> StoreResult<Vec<T>> {
        let rows = self
            .executor
            .fetch_all(&self.statement.select_sql(), &self.statement.params)
            .await?;
        Self::map_rows(&rows)
    }
}

#[async_trait]
impl<T> AsyncQueryable for PgQuery<T>
where
    T: TryFromRow<PgRow> + Send + 'static,
{
    type Item = T;
    type Error = StoreError;

    async fn count_async(&self) -> StoreResult<usize> {
        let row = self
            .executor
            .fetch_one(&self.statement.count_sql(), &self.statement.params)
            .await?;
        get_count(&row, 0).map_err(StoreError::RowMapping)
    }

    async fn fetch_async(&self, window: PageWindow) -> StoreResult<Vec<T>> {
        let rows = self
            .executor
            .fetch_all(&self.statement.fetch_sql(), &self.statement.window_params(window))
            .await?;
        Self::map_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use data_access_db::pagination::{AsyncPagedQuery, PagedCollection};
    use serial_test::serial;
    use sqlx::Row;
    use uuid::Uuid;

    use super::*;
    use crate::test_helper::setup_test_context;

    #[derive(Debug, Clone, PartialEq)]
    struct ProductRow {
        id: Uuid,
        name: String,
        price: i32,
    }

    impl TryFromRow<PgRow> for ProductRow {
        fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
            Ok(ProductRow {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                price: row.try_get("price")?,
            })
        }
    }

    #[test]
    fn test_paging_sql_wraps_statement() {
        let statement = PagedSql::new(
            "  SELECT * FROM product WHERE price > $1 ORDER BY price; ".to_string(),
            vec![SqlParam::Int(10)],
        );

        assert_eq!(
            statement.count_sql(),
            "SELECT COUNT(*) FROM (SELECT * FROM product WHERE price > $1 ORDER BY price) \
             AS paged_source"
        );
        assert_eq!(
            statement.fetch_sql(),
            "SELECT * FROM (SELECT * FROM product WHERE price > $1 ORDER BY price) \
             AS paged_source LIMIT $2 OFFSET $3"
        );
        assert_eq!(
            statement.window_params(PageWindow::new(40, 20)),
            vec![SqlParam::Int(10), SqlParam::Int(20), SqlParam::Int(40)]
        );
    }

    #[test]
    fn test_outer_order_is_applied_before_window() {
        let mut statement = PagedSql::new(
            "SELECT * FROM product WHERE price > $1".to_string(),
            vec![SqlParam::Int(10)],
        );
        assert_eq!(statement.select_sql(), "SELECT * FROM product WHERE price > $1");

        statement.order = Some("price DESC, id".to_string());
        assert_eq!(
            statement.fetch_sql(),
            "SELECT * FROM (SELECT * FROM product WHERE price > $1) AS paged_source \
             ORDER BY price DESC, id LIMIT $2 OFFSET $3"
        );
        assert_eq!(
            statement.select_sql(),
            "SELECT * FROM (SELECT * FROM product WHERE price > $1) AS paged_source \
             ORDER BY price DESC, id"
        );
        assert_eq!(
            statement.count_sql(),
            "SELECT COUNT(*) FROM (SELECT * FROM product WHERE price > $1) AS paged_source"
        );
    }

    #[test]
    fn test_paging_sql_without_binds() {
        let statement = PagedSql::new("SELECT * FROM product".to_string(), Vec::new());
        assert!(statement.fetch_sql().ends_with("LIMIT $1 OFFSET $2"));
        assert_eq!(
            statement.window_params(PageWindow::new(0, 5)),
            vec![SqlParam::Int(5), SqlParam::Int(0)]
        );
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a Postgres database (DATABASE_URL)"]
    async fn test_pages_products() -> Result<(), Box<dyn Error + Send + Sync>> {
        let unit_of_work = setup_test_context().await?;
        let tag = Uuid::new_v4().to_string();
        for price in 0..45i32 {
            unit_of_work
                .execute_sql_raw(
                    "INSERT INTO product (id, name, price) VALUES ($1, $2, $3)",
                    &[Uuid::new_v4().into(), tag.clone().into(), price.into()],
                )
                .await?;
        }

        let products = unit_of_work
            .from_sql_raw::<ProductRow>(
                "SELECT * FROM product WHERE name = $1",
                vec![tag.clone().into()],
            )
            .order_by("price");
        let page = products.to_paged_list_async(10, 4).await?;
        assert_eq!(page.total_count(), 45);
        assert_eq!(page.total_pages(), 5);
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].price, 40);

        let err = products.to_paged_list_async(10, 5).await.unwrap_err();
        assert!(err.as_pagination().and_then(|e| e.page_not_found()).is_some());

        let dictionary = products.to_paged_dictionary_async(|p| p.id, 10, 0).await?;
        assert_eq!(dictionary.len(), 10);

        unit_of_work.rollback().await?;
        Ok(())
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a Postgres database (DATABASE_URL)"]
    async fn test_empty_result_has_one_page() -> Result<(), Box<dyn Error + Send + Sync>> {
        let unit_of_work = setup_test_context().await?;
        let products = unit_of_work.from_sql_raw::<ProductRow>(
            "SELECT * FROM product WHERE name = $1",
            vec![Uuid::new_v4().to_string().into()],
        );

        let page = products.to_paged_array_async(20, 0).await?;
        assert!(page.is_empty());
        assert_eq!(page.total_pages(), 1);

        unit_of_work.rollback().await?;
        Ok(())
    }
}
