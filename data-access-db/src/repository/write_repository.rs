use async_trait::async_trait;
use data_access_api::StoreResult;

use super::read_only_repository::ReadOnlyRepository;
use crate::models::Entity;

/// Read and write access to the entities of one type
///
/// Writes are queued in the owning context and only reach the store when the
/// unit of work saves its changes.
///
/// # Type Parameters
/// * `T` - The entity type
///
/// # Example
/// ```ignore
/// let repository = unit_of_work.get_repository::<Product>()?;
/// repository.insert(product)?;
/// unit_of_work.save_changes()?;
/// ```
#[async_trait]
pub trait Repository<T: Entity>: ReadOnlyRepository<T> {
    /// Queue an entity for insertion
    fn insert(&self, entity: T) -> StoreResult<()>;

    /// Queue several entities for insertion, in order
    fn insert_range(&self, entities: Vec<T>) -> StoreResult<()>;

    /// Queue an entity for insertion and hand it back
    async fn insert_async(&self, entity: T) -> StoreResult<T> {
        self.insert(entity.clone())?;
        Ok(entity)
    }

    async fn insert_range_async(&self, entities: Vec<T>) -> StoreResult<()> {
        self.insert_range(entities)
    }

    fn update(&self, entity: T) -> StoreResult<()>;

    fn update_range(&self, entities: Vec<T>) -> StoreResult<()>;

    /// Queue the removal of an entity
    fn delete(&self, entity: &T) -> StoreResult<()>;

    fn delete_range(&self, entities: &[T]) -> StoreResult<()>;

    /// Queue the removal of the entity with key `id`
    ///
    /// # Returns
    /// * `Ok(true)` - The entity was found and its removal queued
    /// * `Ok(false)` - No entity has this key; nothing was queued
    fn delete_by_id(&self, id: &T::Id) -> StoreResult<bool> {
        match self.find(id)? {
            Some(entity) => {
                self.delete(&entity)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
