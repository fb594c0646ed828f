use std::num::NonZeroUsize;

use data_access_api::{PageNotFound, PaginationError};

use super::page_request::PageRequest;
use super::paged_collection::PageMetadata;

/// Offset and limit applied to a source to select one page of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Number of rows to skip
    pub skip: usize,
    /// Maximum number of rows to take
    pub take: usize,
}

impl PageWindow {
    pub fn new(skip: usize, take: usize) -> Self {
        Self { skip, take }
    }
}

/// Outcome of a page computation: what to fetch and how to describe it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub page_number: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub window: PageWindow,
}

impl PagePlan {
    pub fn metadata(&self) -> PageMetadata {
        PageMetadata {
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

pub struct PageComputer;

impl PageComputer {
    /// Number of pages needed for `source_count` items, never less than one
    pub fn total_pages(source_count: usize, page_size: NonZeroUsize) -> usize {
        source_count.div_ceil(page_size.get()).max(1)
    }

    /// Compute the page window for a validated request
    ///
    /// An empty source still has one page (page 0), so only pages other than 0
    /// are rejected for it.
    ///
    /// # Arguments
    /// * `source_count` - Number of items matched by the source
    /// * `request` - The validated page request
    ///
    /// # Returns
    /// * `Ok(PagePlan)` - Total pages plus the skip/take window
    /// * `Err(PaginationError::PageNotFound)` - The page is beyond the last page
    pub fn compute(source_count: usize, request: PageRequest) -> Result<PagePlan, PaginationError> {
        let total_pages = Self::total_pages(source_count, request.page_size_non_zero());
        let page_number = request.page_number();
        if page_number >= total_pages {
            return Err(PageNotFound {
                page_number,
                total_pages,
            }
            .into());
        }

        Ok(PagePlan {
            page_number,
            page_size: request.page_size(),
            total_count: source_count,
            total_pages,
            window: PageWindow::new(request.offset(), request.limit()),
        })
    }
}
