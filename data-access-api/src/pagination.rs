use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected pagination input, detected before the source is touched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageArgumentError {
    #[error("The page size must be greater than zero (got {0})")]
    PageSize(i64),

    #[error("The page number must be greater than or equal to zero (got {0})")]
    PageNumber(i64),
}

/// The requested page lies outside the pages of the collection.
///
/// Carries the requested page and the total pages computed from the count
/// query, so callers can fall back to the last valid page.
///
/// # Example
/// ```
/// use data_access_api::PageNotFound;
///
/// let err = PageNotFound { page_number: 3, total_pages: 2 };
/// assert_eq!(err.last_page(), 1);
/// assert_eq!(err.to_string(), "Not found the page 3, the range of pages is 0 to 1");
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[error(
    "Not found the page {page_number}, the range of pages is 0 to {}",
    .total_pages.saturating_sub(1)
)]
pub struct PageNotFound {
    /// Page number requested by the caller
    pub page_number: usize,
    /// Total pages found when the page was requested
    pub total_pages: usize,
}

impl PageNotFound {
    /// Index of the last page that could have been requested
    pub fn last_page(&self) -> usize {
        self.total_pages.saturating_sub(1)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error(transparent)]
    InvalidArgument(#[from] PageArgumentError),

    #[error(transparent)]
    PageNotFound(#[from] PageNotFound),

    #[error(
        "The key selector produced a duplicate key at position {position} of page {page_number}"
    )]
    DuplicateKey { page_number: usize, position: usize },

    #[error("The pagination was cancelled")]
    Cancelled,
}

impl PaginationError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PaginationError::InvalidArgument(_))
    }

    /// Returns the out-of-range details when the page was not found
    pub fn page_not_found(&self) -> Option<&PageNotFound> {
        match self {
            PaginationError::PageNotFound(not_found) => Some(not_found),
            _ => None,
        }
    }
}

pub type PaginationResult<T> = Result<T, PaginationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_not_found_message_uses_zero_based_range() {
        let err = PaginationError::from(PageNotFound {
            page_number: 1,
            total_pages: 1,
        });
        assert_eq!(
            err.to_string(),
            "Not found the page 1, the range of pages is 0 to 0"
        );
        assert_eq!(
            err.page_not_found(),
            Some(&PageNotFound {
                page_number: 1,
                total_pages: 1
            })
        );
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_page_not_found_keeps_diagnostics_when_serialized() -> Result<(), serde_json::Error> {
        let err = PageNotFound {
            page_number: 21,
            total_pages: 20,
        };
        let json = serde_json::to_value(err)?;
        assert_eq!(json["page_number"], 21);
        assert_eq!(json["total_pages"], 20);

        let restored: PageNotFound = serde_json::from_value(json)?;
        assert_eq!(restored, err);
        Ok(())
    }

    #[test]
    fn test_invalid_argument_messages() {
        let size = PaginationError::from(PageArgumentError::PageSize(-1));
        let number = PaginationError::from(PageArgumentError::PageNumber(-500));

        assert!(size.is_invalid_argument());
        assert!(number.is_invalid_argument());
        assert!(size.to_string().contains("page size must be greater than zero"));
        assert!(number
            .to_string()
            .contains("page number must be greater than or equal to zero"));
    }
}
