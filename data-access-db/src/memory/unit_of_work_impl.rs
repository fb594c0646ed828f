use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use data_access_api::{StoreError, StoreResult};
use parking_lot::RwLock;
use tracing::{debug, error, trace};

use super::read_only_repository_impl::ReadOnlyRepositoryImpl;
use super::registry::RepositoryRegistry;
use super::repository_impl::RepositoryImpl;
use crate::models::Entity;
use crate::repository::{ReadOnlyRepository, Repository, RepositoryFactory, UnitOfWork};
use crate::store::MemoryContext;

type RepositoryCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

/// Unit of work over one [`MemoryContext`]
///
/// Repositories are resolved once per entity type and cached: a custom
/// repository from the registry when one is registered, the default
/// implementation otherwise.
pub struct MemoryUnitOfWork {
    context: MemoryContext,
    registry: Arc<RepositoryRegistry>,
    repositories: RepositoryCache,
    read_only_repositories: RepositoryCache,
    disposed: AtomicBool,
}

impl MemoryUnitOfWork {
    pub fn new(context: MemoryContext) -> Self {
        Self::with_registry(context, RepositoryRegistry::default())
    }

    pub fn with_registry(context: MemoryContext, registry: RepositoryRegistry) -> Self {
        Self::with_shared_registry(context, Arc::new(registry))
    }

    /// Create a unit of work sharing a registry with other units
    pub fn with_shared_registry(context: MemoryContext, registry: Arc<RepositoryRegistry>) -> Self {
        Self {
            context,
            registry,
            repositories: RwLock::new(HashMap::new()),
            read_only_repositories: RwLock::new(HashMap::new()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> &MemoryContext {
        &self.context
    }

    fn ensure_active(&self) -> StoreResult<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(StoreError::Disposed);
        }
        Ok(())
    }

    fn cached<R: Clone + 'static>(cache: &RepositoryCache, key: &TypeId) -> Option<R> {
        cache.read().get(key).and_then(|entry| entry.downcast_ref::<R>()).cloned()
    }

    fn ensure_set<T: Entity>(&self) -> StoreResult<()> {
        if self.context.is_registered::<T>() {
            Ok(())
        } else {
            Err(StoreError::EntitySetNotRegistered {
                entity: T::entity_name(),
            })
        }
    }

    /// Save the pending changes of `others` and of this unit as one batch
    ///
    /// Nothing is written unless every unit can be written.
    ///
    /// # Returns
    /// * `Ok(usize)` - Total number of state entries written
    /// * `Err` - The first failure; every unit keeps its pending changes
    pub fn save_changes_with(&self, others: &[&MemoryUnitOfWork]) -> StoreResult<usize> {
        self.ensure_active()?;
        for other in others {
            other.ensure_active()?;
        }

        let contexts: Vec<&MemoryContext> = others
            .iter()
            .map(|other| &other.context)
            .chain(std::iter::once(&self.context))
            .collect();

        debug!(units = contexts.len(), "Beginning transaction");
        match MemoryContext::save_all(&contexts) {
            Ok(written) => {
                debug!(units = contexts.len(), written, "Finalizing transaction");
                Ok(written)
            }
            Err(err) => {
                error!(error = %err, "Error in save_changes_with");
                Err(err)
            }
        }
    }

    pub async fn save_changes_with_async(
        &self,
        others: &[&MemoryUnitOfWork],
    ) -> StoreResult<usize> {
        self.save_changes_with(others)
    }

    /// Drop cached repositories and dispose the context. Disposing twice is a no-op.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        trace!(context = self.context.name(), "Disposing unit of work");
        self.repositories.write().clear();
        self.read_only_repositories.write().clear();
        self.context.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl RepositoryFactory for MemoryUnitOfWork {
    fn get_repository<T: Entity>(&self) -> StoreResult<Arc<dyn Repository<T>>> {
        self.ensure_active()?;
        let entity = T::entity_name();
        let key = TypeId::of::<T>();

        if let Some(repository) = Self::cached::<Arc<dyn Repository<T>>>(&self.repositories, &key) {
            debug!(entity, "Get existing repository");
            return Ok(repository);
        }

        let mut cache = self.repositories.write();
        if let Some(repository) = cache
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<Arc<dyn Repository<T>>>())
        {
            return Ok(Arc::clone(repository));
        }

        debug!(entity, "Get repository from registry");
        let repository = match self.registry.build_repository::<T>(&self.context) {
            Some(repository) => repository,
            None => {
                debug!(entity, "Creating new repository");
                self.ensure_set::<T>()?;
                Arc::new(RepositoryImpl::<T>::new(self.context.clone())) as Arc<dyn Repository<T>>
            }
        };
        cache.insert(key, Arc::new(Arc::clone(&repository)));
        Ok(repository)
    }

    fn get_read_only_repository<T: Entity>(&self) -> StoreResult<Arc<dyn ReadOnlyRepository<T>>> {
        self.ensure_active()?;
        let entity = T::entity_name();
        let key = TypeId::of::<T>();

        if let Some(repository) =
            Self::cached::<Arc<dyn ReadOnlyRepository<T>>>(&self.read_only_repositories, &key)
        {
            debug!(entity, "Get existing read-only repository");
            return Ok(repository);
        }

        let mut cache = self.read_only_repositories.write();
        if let Some(repository) = cache
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<Arc<dyn ReadOnlyRepository<T>>>())
        {
            return Ok(Arc::clone(repository));
        }

        debug!(entity, "Get read-only repository from registry");
        let repository = match self.registry.build_read_only_repository::<T>(&self.context) {
            Some(repository) => repository,
            None => {
                debug!(entity, "Creating new read-only repository");
                self.ensure_set::<T>()?;
                Arc::new(ReadOnlyRepositoryImpl::<T>::new(self.context.clone()))
                    as Arc<dyn ReadOnlyRepository<T>>
            }
        };
        cache.insert(key, Arc::new(Arc::clone(&repository)));
        Ok(repository)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn save_changes(&self) -> StoreResult<usize> {
        self.ensure_active()?;
        debug!(context = self.context.name(), "Saving changes");
        match self.context.save_changes() {
            Ok(written) => {
                debug!(context = self.context.name(), written, "Saved changes");
                Ok(written)
            }
            Err(err) => {
                error!(error = %err, "Error in save_changes");
                Err(err)
            }
        }
    }

    async fn save_changes_async(&self) -> StoreResult<usize> {
        self.save_changes()
    }
}
