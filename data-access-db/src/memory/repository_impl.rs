use std::marker::PhantomData;

use async_trait::async_trait;
use data_access_api::StoreResult;

use super::read_only_repository_impl::ReadOnlyRepositoryImpl;
use crate::models::Entity;
use crate::repository::{ReadOnlyRepository, Repository};
use crate::store::{MemoryContext, OrderBy, Predicate, Query};

/// Default repository over a [`MemoryContext`]
pub struct RepositoryImpl<T> {
    context: MemoryContext,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> RepositoryImpl<T> {
    pub fn new(context: MemoryContext) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    pub fn context(&self) -> &MemoryContext {
        &self.context
    }
}

#[async_trait]
impl<T: Entity> ReadOnlyRepository<T> for RepositoryImpl<T> {
    fn get_all(
        &self,
        predicate: Option<Predicate<T>>,
        order_by: Option<OrderBy<T>>,
    ) -> StoreResult<Query<T>> {
        ReadOnlyRepositoryImpl::query(&self.context, predicate, order_by)
    }

    fn find(&self, id: &T::Id) -> StoreResult<Option<T>> {
        self.context.find::<T>(id)
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for RepositoryImpl<T> {
    fn insert(&self, entity: T) -> StoreResult<()> {
        self.context.add(entity)
    }

    fn insert_range(&self, entities: Vec<T>) -> StoreResult<()> {
        self.context.add_range(entities)
    }

    fn update(&self, entity: T) -> StoreResult<()> {
        self.context.update(entity)
    }

    fn update_range(&self, entities: Vec<T>) -> StoreResult<()> {
        self.context.update_range(entities)
    }

    fn delete(&self, entity: &T) -> StoreResult<()> {
        self.context.remove(entity)
    }

    fn delete_range(&self, entities: &[T]) -> StoreResult<()> {
        self.context.remove_range(entities)
    }
}
