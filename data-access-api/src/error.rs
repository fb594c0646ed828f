use thiserror::Error;

use crate::pagination::PaginationError;

/// Errors raised by entity stores, repositories and units of work.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No entity set is registered for {entity}")]
    EntitySetNotRegistered { entity: &'static str },

    #[error("An entity of type {entity} with key {key} already exists")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("Entity of type {entity} with key {key} does not exist")]
    EntityNotFound { entity: &'static str, key: String },

    #[error("The context has been disposed")]
    Disposed,

    #[error("Transaction has been consumed")]
    TransactionConsumed,

    #[error("Failed to map row: {0}")]
    RowMapping(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[cfg(feature = "sqlx")]
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Returns the pagination failure wrapped by this error, if any
    pub fn as_pagination(&self) -> Option<&PaginationError> {
        match self {
            StoreError::Pagination(err) => Some(err),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageNotFound;

    #[test]
    fn test_pagination_errors_convert_into_store_errors() {
        let err: StoreError = PaginationError::from(PageNotFound {
            page_number: 4,
            total_pages: 2,
        })
        .into();

        let pagination = err.as_pagination().and_then(PaginationError::page_not_found);
        assert_eq!(pagination.map(|p| p.page_number), Some(4));
        assert_eq!(err.to_string(), "Not found the page 4, the range of pages is 0 to 1");
    }

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::EntitySetNotRegistered { entity: "Product" };
        assert_eq!(err.to_string(), "No entity set is registered for Product");
        assert!(err.as_pagination().is_none());
    }
}
