use async_trait::async_trait;
use data_access_api::PaginationError;
use tokio_util::sync::CancellationToken;

use super::page_computer::PageWindow;

/// A deferred, countable and sliceable sequence of items.
///
/// Every call re-evaluates the source; nothing is cached between `count` and
/// `fetch`.
pub trait Queryable {
    type Item;
    type Error;

    /// Number of items the source currently matches
    fn count(&self) -> Result<usize, Self::Error>;

    /// Items inside `window`, in source order
    fn fetch(&self, window: PageWindow) -> Result<Vec<Self::Item>, Self::Error>;
}

/// Asynchronous counterpart of [`Queryable`]
#[async_trait]
pub trait AsyncQueryable: Send + Sync {
    type Item: Send;
    type Error: Send;

    async fn count_async(&self) -> Result<usize, Self::Error>;

    async fn fetch_async(&self, window: PageWindow) -> Result<Vec<Self::Item>, Self::Error>;
}

/// Adapter that stops an asynchronous source as soon as `token` is cancelled.
///
/// A cancelled operation fails with [`PaginationError::Cancelled`] converted
/// into the source error type.
///
/// # Example
/// ```ignore
/// let token = CancellationToken::new();
/// let source = Cancellable::new(query, token.clone());
/// let page = source.to_paged_list_async(20, 0).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Cancellable<Q> {
    inner: Q,
    token: CancellationToken,
}

impl<Q> Cancellable<Q> {
    pub fn new(inner: Q, token: CancellationToken) -> Self {
        Self { inner, token }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn into_inner(self) -> Q {
        self.inner
    }
}

#[async_trait]
impl<Q> AsyncQueryable for Cancellable<Q>
where
    Q: AsyncQueryable,
    Q::Error: From<PaginationError>,
{
    type Item = Q::Item;
    type Error = Q::Error;

    async fn count_async(&self) -> Result<usize, Self::Error> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(PaginationError::Cancelled.into()),
            result = self.inner.count_async() => result,
        }
    }

    async fn fetch_async(&self, window: PageWindow) -> Result<Vec<Self::Item>, Self::Error> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(PaginationError::Cancelled.into()),
            result = self.inner.fetch_async(window) => result,
        }
    }
}

impl<T: Clone> Queryable for [T] {
    type Item = T;
    type Error = PaginationError;

    fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.len())
    }

    fn fetch(&self, window: PageWindow) -> Result<Vec<T>, Self::Error> {
        Ok(self.iter().skip(window.skip).take(window.take).cloned().collect())
    }
}

impl<T: Clone> Queryable for Vec<T> {
    type Item = T;
    type Error = PaginationError;

    fn count(&self) -> Result<usize, Self::Error> {
        self.as_slice().count()
    }

    fn fetch(&self, window: PageWindow) -> Result<Vec<T>, Self::Error> {
        self.as_slice().fetch(window)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> AsyncQueryable for Vec<T> {
    type Item = T;
    type Error = PaginationError;

    async fn count_async(&self) -> Result<usize, Self::Error> {
        self.count()
    }

    async fn fetch_async(&self, window: PageWindow) -> Result<Vec<T>, Self::Error> {
        self.fetch(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_window() {
        let source: Vec<i32> = (0..10).collect();
        assert_eq!(source.count().unwrap(), 10);
        assert_eq!(source.fetch(PageWindow::new(8, 5)).unwrap(), vec![8, 9]);
        assert!(source.fetch(PageWindow::new(20, 5)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_source_stops() {
        let token = CancellationToken::new();
        let source = Cancellable::new((0..10).collect::<Vec<i32>>(), token.clone());
        assert_eq!(source.count_async().await, Ok(10));

        token.cancel();
        assert_eq!(source.count_async().await, Err(PaginationError::Cancelled));
        assert_eq!(
            source.fetch_async(PageWindow::new(0, 2)).await,
            Err(PaginationError::Cancelled)
        );
    }
}
