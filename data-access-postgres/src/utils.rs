use std::error::Error;

use sqlx::postgres::PgRow;
use sqlx::Row;

/// A trait for converting a database row into a model.
pub trait TryFromRow<R>: Sized {
    /// Performs the conversion.
    fn try_from_row(row: &R) -> Result<Self, Box<dyn Error + Send + Sync>>;
}

/// Retrieves a required non-negative count from a row.
pub fn get_count(row: &PgRow, index: usize) -> Result<usize, Box<dyn Error + Send + Sync>> {
    let count: i64 = row.try_get(index)?;
    usize::try_from(count)
        .map_err(|_| format!("Count in column {index} is negative ({count})").into())
}
