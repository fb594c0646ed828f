use std::hash::Hash;

use async_trait::async_trait;
use data_access_api::StoreResult;

use crate::models::Entity;
use crate::pagination::{
    AsyncPagedQuery, AsyncQueryable, PageWindow, PagedArray, PagedDictionary, PagedList,
    PagedQuery, Queryable,
};
use crate::store::{OrderBy, Predicate, Query};

/// Read access to the entities of one type
///
/// Only `get_all` and `find` must be implemented; every other operation is
/// derived from the query returned by `get_all`.
///
/// # Type Parameters
/// * `T` - The entity type
///
/// # Example
/// ```ignore
/// let repository = unit_of_work.get_read_only_repository::<Product>()?;
/// let cheap: Predicate<Product> = Arc::new(|p: &Product| p.price < 10);
/// let page = repository.get_paged_list(20, 0, Some(cheap), None)?;
/// ```
#[async_trait]
pub trait ReadOnlyRepository<T: Entity>: Send + Sync {
    /// Lazy query over the saved entities
    ///
    /// # Arguments
    /// * `predicate` - Optional filter
    /// * `order_by` - Optional ordering, storage order otherwise
    fn get_all(
        &self,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<Query<T>>;

    /// Find an entity by its key, including changes that are not saved yet
    ///
    /// # Returns
    /// * `Ok(Some(T))` - The entity
    /// * `Ok(None)` - No entity with this key
    fn find(&self, id: &T::Id) -> StoreResult<Option<T>>;

    async fn find_async(&self, id: &T::Id) -> StoreResult<Option<T>> {
        self.find(id)
    }

    /// First entity matching `predicate` in `order_by` order
    fn get_first_or_default(
        &self,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<Option<T>> {
        self.get_all(predicate, order_by)?.first()
    }

    async fn get_first_or_default_async(
        &self,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<Option<T>> {
        let query = self.get_all(predicate, order_by)?;
        Ok(query.fetch_async(PageWindow::new(0, 1)).await?.into_iter().next())
    }

    fn count(&self, predicate: Option<Predicate<T>>) -> StoreResult<usize> {
        self.get_all(predicate, None)?.count()
    }

    async fn count_async(&self, predicate: Option<Predicate<T>>) -> StoreResult<usize> {
        self.get_all(predicate, None)?.count_async().await
    }

    fn any(&self, predicate: Option<Predicate<T>>) -> StoreResult<bool> {
        self.get_all(predicate, None)?.any()
    }

    /// One page of the matching entities as an array
    ///
    /// # Arguments
    /// * `page_size` - Maximum number of entities per page
    /// * `page_number` - Zero-based page index
    /// * `predicate` - Optional filter
    /// * `order_by` - Optional ordering
    ///
    /// # Returns
    /// * `Ok(PagedArray<T>)` - The page
    /// * `Err(StoreError::Pagination)` - Invalid arguments or a page beyond the last one
    fn get_paged_array(
        &self,
        page_size: i64,
        page_number: i64,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<PagedArray<T>> {
        self.get_all(predicate, order_by)?.to_paged_array(page_size, page_number)
    }

    async fn get_paged_array_async(
        &self,
        page_size: i64,
        page_number: i64,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<PagedArray<T>> {
        let query = self.get_all(predicate, order_by)?;
        query.to_paged_array_async(page_size, page_number).await
    }

    /// One page of the matching entities as a list
    fn get_paged_list(
        &self,
        page_size: i64,
        page_number: i64,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<PagedList<T>> {
        self.get_all(predicate, order_by)?.to_paged_list(page_size, page_number)
    }

    async fn get_paged_list_async(
        &self,
        page_size: i64,
        page_number: i64,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<PagedList<T>> {
        let query = self.get_all(predicate, order_by)?;
        query.to_paged_list_async(page_size, page_number).await
    }
}

/// Generic read operations available on every [`ReadOnlyRepository`],
/// including `dyn` ones handed out by a unit of work.
#[async_trait]
pub trait ReadOnlyRepositoryExt<T: Entity>: ReadOnlyRepository<T> {
    /// One page keyed by `key_selector`; a repeated key within the page fails
    /// with `PaginationError::DuplicateKey`
    fn get_paged_dictionary<K, F>(
        &self,
        key_selector: F,
        page_size: i64,
        page_number: i64,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<PagedDictionary<K, T>>
    where
        F: Fn(&T) -> K,
        K: Hash + Eq,
    {
        self.get_all(predicate, order_by)?
            .to_paged_dictionary(key_selector, page_size, page_number)
    }

    async fn get_paged_dictionary_async<K, F>(
        &self,
        key_selector: F,
        page_size: i64,
        page_number: i64,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<PagedDictionary<K, T>>
    where
        F: Fn(&T) -> K + Send,
        K: Hash + Eq + Send,
    {
        let query = self.get_all(predicate, order_by)?;
        query
            .to_paged_dictionary_async(key_selector, page_size, page_number)
            .await
    }

    /// Project the first matching entity through `selector`
    fn get_first_or_default_as<R, F>(
        &self,
        selector: F,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<Option<R>>
    where
        F: FnOnce(T) -> R,
    {
        Ok(self.get_first_or_default(predicate, order_by)?.map(selector))
    }

    async fn get_first_or_default_as_async<R, F>(
        &self,
        selector: F,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<Option<R>>
    where
        F: FnOnce(T) -> R + Send,
        R: Send,
    {
        let first = self.get_first_or_default_async(predicate, order_by).await?;
        Ok(first.map(selector))
    }
}

impl<T: Entity, R: ReadOnlyRepository<T> + ?Sized> ReadOnlyRepositoryExt<T> for R {}
