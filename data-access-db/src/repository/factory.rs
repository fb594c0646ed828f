use std::sync::Arc;

use data_access_api::StoreResult;

use super::read_only_repository::ReadOnlyRepository;
use super::write_repository::Repository;
use crate::models::Entity;

/// Hands out repositories for any entity type
pub trait RepositoryFactory {
    /// Repository with write access for `T`
    ///
    /// # Returns
    /// * `Ok(Arc<dyn Repository<T>>)` - The repository, shared with later calls
    /// * `Err(StoreError::EntitySetNotRegistered)` - The store has no set for `T`
    fn get_repository<T: Entity>(&self) -> StoreResult<Arc<dyn Repository<T>>>;

    /// Repository with read access for `T`
    fn get_read_only_repository<T: Entity>(&self) -> StoreResult<Arc<dyn ReadOnlyRepository<T>>>;
}
