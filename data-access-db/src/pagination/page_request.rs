use std::num::NonZeroUsize;

use data_access_api::{PageArgumentError, PaginationError};
use serde::Serialize;

const DEFAULT_PAGE_SIZE: usize = 20;

/// Validated pagination request for offset-based pagination
///
/// Page numbers are zero-based.
///
/// # Example
/// ```
/// use std::num::NonZeroUsize;
/// use data_access_db::pagination::PageRequest;
///
/// let page_size = NonZeroUsize::new(20).unwrap();
/// let first_page = PageRequest::new(page_size, 0); // offset: 0
/// let third_page = PageRequest::new(page_size, 2); // offset: 40
/// assert_eq!(first_page.offset(), 0);
/// assert_eq!(third_page.offset(), 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page_size: NonZeroUsize,
    page_number: usize,
}

impl PageRequest {
    /// Create a new page request
    ///
    /// # Arguments
    /// * `page_size` - Maximum number of items per page
    /// * `page_number` - Zero-based index of the requested page
    pub fn new(page_size: NonZeroUsize, page_number: usize) -> Self {
        Self {
            page_size,
            page_number,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    pub fn page_size_non_zero(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Number of items to skip before this page
    pub fn offset(&self) -> usize {
        self.page_number.saturating_mul(self.page_size.get())
    }

    /// Maximum number of items to return
    pub fn limit(&self) -> usize {
        self.page_size.get()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
            page_number: 0,
        }
    }
}

/// Checks raw page inputs before any data access happens.
pub struct PageValidator;

impl PageValidator {
    /// Validate a page number and a page size supplied by a caller
    ///
    /// # Arguments
    /// * `page_number` - Requested page, must be zero or positive
    /// * `page_size` - Requested page size, must be positive
    ///
    /// # Returns
    /// * `Ok(PageRequest)` - The validated request
    /// * `Err(PaginationError::InvalidArgument)` - The page number is checked first,
    ///   then the page size
    pub fn validate(page_number: i64, page_size: i64) -> Result<PageRequest, PaginationError> {
        if page_number < 0 {
            return Err(PageArgumentError::PageNumber(page_number).into());
        }
        if page_size <= 0 {
            return Err(PageArgumentError::PageSize(page_size).into());
        }

        let page_size = usize::try_from(page_size)
            .ok()
            .and_then(NonZeroUsize::new)
            .unwrap_or(NonZeroUsize::MAX);
        let page_number = usize::try_from(page_number).unwrap_or(usize::MAX);

        Ok(PageRequest::new(page_size, page_number))
    }
}
