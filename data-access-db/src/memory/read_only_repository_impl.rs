use std::marker::PhantomData;

use async_trait::async_trait;
use data_access_api::StoreResult;

use crate::models::Entity;
use crate::repository::ReadOnlyRepository;
use crate::store::{MemoryContext, OrderBy, Predicate, Query};

/// Default read-only repository over a [`MemoryContext`]
pub struct ReadOnlyRepositoryImpl<T> {
    context: MemoryContext,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> ReadOnlyRepositoryImpl<T> {
    pub fn new(context: MemoryContext) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    pub fn context(&self) -> &MemoryContext {
        &self.context
    }

    /// Query shared by the default repositories: saved rows of `T`, filtered
    /// and ordered when asked to
    pub(crate) fn query(
        context: &MemoryContext,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<Query<T>> {
        let query = context.query::<T>()?;
        let query = match predicate {
            Some(predicate) => query.filter_by(predicate),
            None => query,
        };
        Ok(query.with_order(order_by))
    }
}

#[async_trait]
impl<T: Entity> ReadOnlyRepository<T> for ReadOnlyRepositoryImpl<T> {
    fn get_all(
        &self,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<Query<T>> {
        Self::query(&self.context, predicate, order_by)
    }

    fn find(&self, id: &T::Id) -> StoreResult<Option<T>> {
        self.context.find::<T>(id)
    }
}
