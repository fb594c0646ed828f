use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use data_access_api::{StoreError, StoreResult};

use crate::pagination::{AsyncQueryable, PageWindow, Queryable};

/// Shared row filter
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Shared row comparator
pub type OrderBy<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Backing rows of a [`Query`].
///
/// `scan` visits every row in storage order and fails when the rows are no
/// longer reachable (for example after the owning context was disposed).
pub trait RowSource<T>: Send + Sync {
    fn scan(&self, visit: &mut dyn FnMut(&T)) -> StoreResult<()>;
}

impl<T: Send + Sync> RowSource<T> for Vec<T> {
    fn scan(&self, visit: &mut dyn FnMut(&T)) -> StoreResult<()> {
        self.iter().for_each(visit);
        Ok(())
    }
}

/// Lazily evaluated, filterable and orderable view over a row source.
///
/// Building a query never touches the rows; every terminal operation
/// (`to_vec`, `first`, `any`, `count`, `fetch`) scans the source again, so
/// results reflect the rows at call time. Ordering is stable: rows comparing
/// equal keep their storage order.
///
/// # Example
/// ```
/// use data_access_db::pagination::PagedQuery;
/// use data_access_db::store::Query;
///
/// let query = Query::from_vec((1..=10).collect::<Vec<i32>>())
///     .filter(|n| n % 2 == 0)
///     .order_by_key_desc(|n| *n);
///
/// assert_eq!(query.to_vec().unwrap(), vec![10, 8, 6, 4, 2]);
/// assert_eq!(query.to_paged_list(2, 1).unwrap().items(), &[6, 4]);
/// ```
pub struct Query<T> {
    source: Arc<dyn RowSource<T>>,
    filters: Vec<Predicate<T>>,
    order: Option<OrderBy<T>>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            filters: self.filters.clone(),
            order: self.order.clone(),
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filters", &self.filters.len())
            .field("ordered", &self.order.is_some())
            .finish()
    }
}

impl<T> Query<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(source: Arc<dyn RowSource<T>>) -> Self {
        Self {
            source,
            filters: Vec::new(),
            order: None,
        }
    }

    /// Query over an owned vector of rows
    pub fn from_vec(rows: Vec<T>) -> Self {
        Self::new(Arc::new(rows))
    }

    /// Keep only the rows matching `predicate`, in addition to earlier filters
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter_by(Arc::new(predicate))
    }

    pub fn filter_by(mut self, predicate: Predicate<T>) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Replace the ordering with `compare`
    pub fn order_by<F>(self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.with_order(Some(Arc::new(compare)))
    }

    pub fn order_by_key<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order_by(move |a, b| key(a).cmp(&key(b)))
    }

    pub fn order_by_key_desc<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order_by(move |a, b| key(b).cmp(&key(a)))
    }

    /// Break ties of the current ordering with `key`
    pub fn then_by_key<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let previous = self.order.clone();
        self.order_by(move |a, b| {
            let first = previous.as_ref().map_or(Ordering::Equal, |compare| compare(a, b));
            first.then_with(|| key(a).cmp(&key(b)))
        })
    }

    pub fn with_order(mut self, order: Option<OrderBy<T>>) -> Self {
        self.order = order;
        self
    }

    pub fn is_ordered(&self) -> bool {
        self.order.is_some()
    }

    fn matches(&self, row: &T) -> bool {
        self.filters.iter().all(|predicate| predicate(row))
    }

    /// Materialize every matching row in query order
    pub fn to_vec(&self) -> StoreResult<Vec<T>> {
        let mut rows = Vec::new();
        self.source.scan(&mut |row| {
            if self.matches(row) {
                rows.push(row.clone());
            }
        })?;
        if let Some(compare) = &self.order {
            rows.sort_by(|a, b| compare(a, b));
        }
        Ok(rows)
    }

    pub fn first(&self) -> StoreResult<Option<T>> {
        Ok(self.window(PageWindow::new(0, 1))?.into_iter().next())
    }

    pub fn any(&self) -> StoreResult<bool> {
        let mut found = false;
        self.source.scan(&mut |row| {
            if !found && self.matches(row) {
                found = true;
            }
        })?;
        Ok(found)
    }

    fn len(&self) -> StoreResult<usize> {
        let mut count = 0;
        self.source.scan(&mut |row| {
            if self.matches(row) {
                count += 1;
            }
        })?;
        Ok(count)
    }

    fn window(&self, window: PageWindow) -> StoreResult<Vec<T>> {
        if self.order.is_some() {
            let rows = self.to_vec()?;
            return Ok(rows.into_iter().skip(window.skip).take(window.take).collect());
        }

        // unordered: only clone the rows inside the window
        let mut rows = Vec::with_capacity(window.take.min(1024));
        let mut position = 0usize;
        self.source.scan(&mut |row| {
            if !self.matches(row) {
                return;
            }
            if position >= window.skip && rows.len() < window.take {
                rows.push(row.clone());
            }
            position += 1;
        })?;
        Ok(rows)
    }
}

impl<T> Queryable for Query<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;
    type Error = StoreError;

    fn count(&self) -> StoreResult<usize> {
        self.len()
    }

    fn fetch(&self, window: PageWindow) -> StoreResult<Vec<T>> {
        self.window(window)
    }
}

#[async_trait]
impl<T> AsyncQueryable for Query<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;
    type Error = StoreError;

    async fn count_async(&self) -> StoreResult<usize> {
        self.len()
    }

    async fn fetch_async(&self, window: PageWindow) -> StoreResult<Vec<T>> {
        self.window(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{AsyncPagedQuery, PagedCollection, PagedQuery};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        group: u8,
        value: i32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { group: 2, value: 5 },
            Row { group: 1, value: 3 },
            Row { group: 2, value: 1 },
            Row { group: 1, value: 4 },
        ]
    }

    #[test]
    fn test_filters_are_combined() {
        let query = Query::from_vec(rows()).filter(|r| r.group == 2).filter(|r| r.value > 2);
        assert_eq!(query.to_vec().unwrap(), vec![Row { group: 2, value: 5 }]);
        assert!(query.any().unwrap());
        assert_eq!(query.count().unwrap(), 1);
    }

    #[test]
    fn test_ordering_is_stable() {
        let query = Query::from_vec(rows()).order_by_key(|r| r.group);
        let values: Vec<i32> = query.to_vec().unwrap().into_iter().map(|r| r.value).collect();
        assert_eq!(values, vec![3, 4, 5, 1]);

        let query = query.then_by_key(|r| r.value);
        let values: Vec<i32> = query.to_vec().unwrap().into_iter().map(|r| r.value).collect();
        assert_eq!(values, vec![3, 4, 1, 5]);
    }

    #[test]
    fn test_fetch_window() {
        let query = Query::from_vec((0..10).collect::<Vec<i32>>());
        assert_eq!(query.fetch(PageWindow::new(3, 2)).unwrap(), vec![3, 4]);

        let query = query.filter(|n| n % 3 == 0).order_by_key_desc(|n| *n);
        assert_eq!(query.fetch(PageWindow::new(1, 10)).unwrap(), vec![6, 3, 0]);
        assert_eq!(query.first().unwrap(), Some(9));
    }

    #[test]
    fn test_empty_query() {
        let query = Query::from_vec(rows()).filter(|r| r.value > 100);
        assert_eq!(query.first().unwrap(), None);
        assert!(!query.any().unwrap());

        let page = query.to_paged_list(20, 0).unwrap();
        assert_eq!(page.total_pages(), 1);
        assert!(page.is_empty());

        let err = query.to_paged_list(20, 1).unwrap_err();
        assert!(err.as_pagination().and_then(|e| e.page_not_found()).is_some());
    }

    #[tokio::test]
    async fn test_async_page_matches_sync() {
        let query = Query::from_vec((0..57).collect::<Vec<i32>>()).order_by_key_desc(|n| *n);
        let sync_page = query.to_paged_array(10, 5).unwrap();
        let async_page = query.to_paged_array_async(10, 5).await.unwrap();
        assert_eq!(sync_page, async_page);
        assert_eq!(async_page.items(), &[6, 5, 4, 3, 2, 1, 0]);
    }
}
