use std::hash::Hash;

use async_trait::async_trait;
use data_access_api::PaginationError;
use tracing::debug;

use super::materialize::{ArrayShape, DictionaryShape, ListShape, Materialize};
use super::page_computer::{PageComputer, PagePlan};
use super::page_request::PageValidator;
use super::paged_collection::{PagedArray, PagedDictionary, PagedList};
use super::queryable::{AsyncQueryable, Queryable};

/// Paginate a source into the collection shape selected by `shape`
///
/// Validates the inputs, counts the source once, computes the page window and
/// fetches it once.
///
/// # Arguments
/// * `source` - The source to paginate
/// * `page_size` - Maximum number of items per page, must be positive
/// * `page_number` - Zero-based page index, must not be negative
/// * `shape` - Materialization strategy for the fetched rows
///
/// # Returns
/// * `Ok(M::Output)` - The requested page
/// * `Err(Q::Error)` - A pagination failure converted into the source error,
///   or the source error itself
pub fn paginate<Q, M>(
    source: &Q,
    page_size: i64,
    page_number: i64,
    shape: M,
) -> Result<M::Output, Q::Error>
where
    Q: Queryable + ?Sized,
    Q::Error: From<PaginationError>,
    M: Materialize<Q::Item>,
{
    let request = PageValidator::validate(page_number, page_size)?;
    let plan = PageComputer::compute(source.count()?, request)?;
    let rows = source.fetch(plan.window)?;
    Ok(assemble(plan, rows, shape)?)
}

/// Asynchronous form of [`paginate`]
pub async fn paginate_async<Q, M>(
    source: &Q,
    page_size: i64,
    page_number: i64,
    shape: M,
) -> Result<M::Output, Q::Error>
where
    Q: AsyncQueryable + ?Sized,
    Q::Error: From<PaginationError>,
    M: Materialize<Q::Item> + Send,
{
    let request = PageValidator::validate(page_number, page_size)?;
    let plan = PageComputer::compute(source.count_async().await?, request)?;
    let rows = source.fetch_async(plan.window).await?;
    Ok(assemble(plan, rows, shape)?)
}

fn assemble<T, M>(plan: PagePlan, mut rows: Vec<T>, shape: M) -> Result<M::Output, PaginationError>
where
    M: Materialize<T>,
{
    // a source may ignore the limit, never hand out more than one page
    rows.truncate(plan.window.take);
    debug!(
        page_number = plan.page_number,
        page_size = plan.page_size,
        total_count = plan.total_count,
        total_pages = plan.total_pages,
        fetched = rows.len(),
        "Materializing page"
    );
    shape.materialize(plan.metadata(), rows)
}

/// Pagination operations available on every [`Queryable`] source.
///
/// # Example
/// ```
/// use data_access_db::pagination::{PagedCollection, PagedQuery};
///
/// let source: Vec<u32> = (0..45).collect();
/// let page = source.to_paged_list(10, 4).unwrap();
///
/// assert_eq!(page.items(), &[40, 41, 42, 43, 44]);
/// assert_eq!(page.total_pages(), 5);
/// assert!(!page.has_next_page());
/// ```
pub trait PagedQuery: Queryable {
    fn to_paged_array(
        &self,
        page_size: i64,
        page_number: i64,
    ) -> Result<PagedArray<Self::Item>, Self::Error>
    where
        Self::Error: From<PaginationError>,
    {
        paginate(self, page_size, page_number, ArrayShape)
    }

    fn to_paged_list(
        &self,
        page_size: i64,
        page_number: i64,
    ) -> Result<PagedList<Self::Item>, Self::Error>
    where
        Self::Error: From<PaginationError>,
    {
        paginate(self, page_size, page_number, ListShape)
    }

    /// Page keyed by `key_selector`, failing on the first duplicate key
    fn to_paged_dictionary<K, F>(
        &self,
        key_selector: F,
        page_size: i64,
        page_number: i64,
    ) -> Result<PagedDictionary<K, Self::Item>, Self::Error>
    where
        Self::Error: From<PaginationError>,
        F: Fn(&Self::Item) -> K,
        K: Hash + Eq,
    {
        paginate(self, page_size, page_number, DictionaryShape(key_selector))
    }
}

impl<Q: Queryable + ?Sized> PagedQuery for Q {}

/// Pagination operations available on every [`AsyncQueryable`] source.
///
/// Results are identical to the [`PagedQuery`] ones for the same source state.
#[async_trait]
pub trait AsyncPagedQuery: AsyncQueryable {
    async fn to_paged_array_async(
        &self,
        page_size: i64,
        page_number: i64,
    ) -> Result<PagedArray<Self::Item>, Self::Error>
    where
        Self::Error: From<PaginationError>,
    {
        paginate_async(self, page_size, page_number, ArrayShape).await
    }

    async fn to_paged_list_async(
        &self,
        page_size: i64,
        page_number: i64,
    ) -> Result<PagedList<Self::Item>, Self::Error>
    where
        Self::Error: From<PaginationError>,
    {
        paginate_async(self, page_size, page_number, ListShape).await
    }

    async fn to_paged_dictionary_async<K, F>(
        &self,
        key_selector: F,
        page_size: i64,
        page_number: i64,
    ) -> Result<PagedDictionary<K, Self::Item>, Self::Error>
    where
        Self::Error: From<PaginationError>,
        F: Fn(&Self::Item) -> K + Send,
        K: Hash + Eq + Send,
    {
        paginate_async(self, page_size, page_number, DictionaryShape(key_selector)).await
    }
}

impl<Q: AsyncQueryable + ?Sized> AsyncPagedQuery for Q {}
