use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::Entity;
use crate::repository::{ReadOnlyRepository, Repository};
use crate::store::MemoryContext;

type RepositoryConstructor<T> =
    Arc<dyn Fn(&MemoryContext) -> Arc<dyn Repository<T>> + Send + Sync>;
type ReadOnlyRepositoryConstructor<T> =
    Arc<dyn Fn(&MemoryContext) -> Arc<dyn ReadOnlyRepository<T>> + Send + Sync>;

/// Custom repositories a unit of work should hand out instead of the default ones
///
/// # Example
/// ```ignore
/// let registry = RepositoryRegistry::new()
///     .add_repository::<Product, _, _>(|context| ProductRepository::new(context.clone()));
/// let unit_of_work = MemoryUnitOfWork::with_registry(context, registry);
/// ```
#[derive(Clone, Default)]
pub struct RepositoryRegistry {
    repositories: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    read_only_repositories: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the repository constructor used for `T`
    pub fn add_repository<T, R, F>(mut self, constructor: F) -> Self
    where
        T: Entity,
        R: Repository<T> + 'static,
        F: Fn(&MemoryContext) -> R + Send + Sync + 'static,
    {
        let constructor: RepositoryConstructor<T> = Arc::new(move |context: &MemoryContext| {
            Arc::new(constructor(context)) as Arc<dyn Repository<T>>
        });
        self.repositories.insert(TypeId::of::<T>(), Arc::new(constructor));
        self
    }

    /// Register the read-only repository constructor used for `T`
    pub fn add_read_only_repository<T, R, F>(mut self, constructor: F) -> Self
    where
        T: Entity,
        R: ReadOnlyRepository<T> + 'static,
        F: Fn(&MemoryContext) -> R + Send + Sync + 'static,
    {
        let constructor: ReadOnlyRepositoryConstructor<T> =
            Arc::new(move |context: &MemoryContext| {
                Arc::new(constructor(context)) as Arc<dyn ReadOnlyRepository<T>>
            });
        self.read_only_repositories
            .insert(TypeId::of::<T>(), Arc::new(constructor));
        self
    }

    pub fn has_repository<T: Entity>(&self) -> bool {
        self.repositories.contains_key(&TypeId::of::<T>())
    }

    pub fn has_read_only_repository<T: Entity>(&self) -> bool {
        self.read_only_repositories.contains_key(&TypeId::of::<T>())
    }

    pub(crate) fn build_repository<T: Entity>(
        &self,
        context: &MemoryContext,
    ) -> Option<Arc<dyn Repository<T>>> {
        self.repositories
            .get(&TypeId::of::<T>())?
            .downcast_ref::<RepositoryConstructor<T>>()
            .map(|constructor| constructor(context))
    }

    pub(crate) fn build_read_only_repository<T: Entity>(
        &self,
        context: &MemoryContext,
    ) -> Option<Arc<dyn ReadOnlyRepository<T>>> {
        self.read_only_repositories
            .get(&TypeId::of::<T>())?
            .downcast_ref::<ReadOnlyRepositoryConstructor<T>>()
            .map(|constructor| constructor(context))
    }
}
