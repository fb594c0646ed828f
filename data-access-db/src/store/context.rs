use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use data_access_api::{StoreError, StoreResult};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use super::entity_set::{Change, EntitySet, PendingBatch, SetHandle, TrackedSet};
use super::query::{Query, RowSource};
use crate::models::Entity;

struct SetEntry {
    tracked: Arc<dyn TrackedSet>,
    typed: Arc<dyn Any + Send + Sync>,
}

struct ContextInner {
    name: String,
    sets: RwLock<HashMap<TypeId, SetEntry>>,
    disposed: AtomicBool,
    save_lock: Mutex<()>,
}

/// In-memory entity store with change tracking.
///
/// A context holds one entity set per registered entity type. Adds, updates
/// and removals are queued as pending changes and only become visible to
/// queries once [`MemoryContext::save_changes`] succeeds. A save either
/// applies every pending change or none of them.
///
/// The handle is cheap to clone; clones share the same sets.
///
/// # Example
/// ```ignore
/// let context = MemoryContext::new().with_set::<Product>();
/// context.add(product)?;
/// assert_eq!(context.save_changes()?, 1);
/// ```
#[derive(Clone)]
pub struct MemoryContext {
    inner: Arc<ContextInner>,
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContext")
            .field("name", &self.inner.name)
            .field("sets", &self.inner.sets.read().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::named("MemoryContext")
    }

    /// Create a context with a name used in logs
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.into(),
                sets: RwLock::new(HashMap::new()),
                disposed: AtomicBool::new(false),
                save_lock: Mutex::new(()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Register an entity set for `T`. Registering twice keeps the existing set.
    pub fn register<T: Entity>(&self) -> StoreResult<()> {
        self.ensure_active()?;
        self.inner.sets.write().entry(TypeId::of::<T>()).or_insert_with(|| {
            let set = Arc::new(EntitySet::<T>::new());
            SetEntry {
                tracked: Arc::new(SetHandle(Arc::clone(&set))),
                typed: set,
            }
        });
        Ok(())
    }

    /// Builder form of [`MemoryContext::register`]
    ///
    /// Clones share their sets, so this handle may already be disposed; the
    /// set is then not registered and the failure is only logged.
    pub fn with_set<T: Entity>(self) -> Self {
        if let Err(err) = self.register::<T>() {
            warn!(
                context = %self.inner.name,
                entity = T::entity_name(),
                error = %err,
                "Entity set not registered"
            );
        }
        self
    }

    pub fn is_registered<T: Entity>(&self) -> bool {
        self.inner.sets.read().contains_key(&TypeId::of::<T>())
    }

    fn ensure_active(&self) -> StoreResult<()> {
        if self.is_disposed() {
            return Err(StoreError::Disposed);
        }
        Ok(())
    }

    fn set<T: Entity>(&self) -> StoreResult<Arc<EntitySet<T>>> {
        self.ensure_active()?;
        self.inner
            .sets
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|entry| Arc::clone(&entry.typed).downcast::<EntitySet<T>>().ok())
            .ok_or(StoreError::EntitySetNotRegistered {
                entity: T::entity_name(),
            })
    }

    /// Queue `entity` for insertion
    pub fn add<T: Entity>(&self, entity: T) -> StoreResult<()> {
        self.set::<T>()?.track(Change::Added(entity));
        Ok(())
    }

    pub fn add_range<T: Entity>(&self, entities: impl IntoIterator<Item = T>) -> StoreResult<()> {
        self.set::<T>()?.track_all(entities.into_iter().map(Change::Added));
        Ok(())
    }

    /// Queue `entity` to replace the stored row with the same key
    pub fn update<T: Entity>(&self, entity: T) -> StoreResult<()> {
        self.set::<T>()?.track(Change::Modified(entity));
        Ok(())
    }

    pub fn update_range<T: Entity>(
        &self,
        entities: impl IntoIterator<Item = T>,
    ) -> StoreResult<()> {
        self.set::<T>()?.track_all(entities.into_iter().map(Change::Modified));
        Ok(())
    }

    /// Queue the removal of the row keyed like `entity`
    pub fn remove<T: Entity>(&self, entity: &T) -> StoreResult<()> {
        self.set::<T>()?.track(Change::Removed(entity.get_id()));
        Ok(())
    }

    pub fn remove_range<'a, T: Entity>(
        &self,
        entities: impl IntoIterator<Item = &'a T>,
    ) -> StoreResult<()> {
        self.set::<T>()?
            .track_all(entities.into_iter().map(|entity| Change::Removed(entity.get_id())));
        Ok(())
    }

    /// Find an entity by key, including changes that are not saved yet
    pub fn find<T: Entity>(&self, id: &T::Id) -> StoreResult<Option<T>> {
        Ok(self.set::<T>()?.find(id))
    }

    /// Lazy query over the saved rows of `T`
    pub fn query<T: Entity>(&self) -> StoreResult<Query<T>> {
        let set = self.set::<T>()?;
        Ok(Query::new(Arc::new(ContextRows {
            context: self.clone(),
            set,
        })))
    }

    pub fn has_changes(&self) -> bool {
        self.pending_changes() > 0
    }

    /// Number of changes waiting for the next save
    pub fn pending_changes(&self) -> usize {
        self.inner
            .sets
            .read()
            .values()
            .map(|entry| entry.tracked.pending_len())
            .sum()
    }

    /// Drop every pending change. Waits for a running save to finish.
    pub fn discard_changes(&self) {
        let _guard = self.inner.save_lock.lock();
        for entry in self.inner.sets.read().values() {
            entry.tracked.discard();
        }
    }

    /// Save every pending change of this context
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of state entries written
    /// * `Err(StoreError::DuplicateKey)` / `Err(StoreError::EntityNotFound)` -
    ///   A change conflicts with the stored rows; nothing was written and the
    ///   changes stay pending
    /// * `Err(StoreError::Disposed)` - The context was disposed
    pub fn save_changes(&self) -> StoreResult<usize> {
        Self::save_all(&[self])
    }

    /// Save the pending changes of several contexts as one atomic batch
    ///
    /// Either every context is written or none is. A context listed twice is
    /// saved once. Changes stay pending, and visible to `find`, until they are
    /// written.
    pub fn save_all(contexts: &[&MemoryContext]) -> StoreResult<usize> {
        let mut unique: Vec<&MemoryContext> = Vec::with_capacity(contexts.len());
        for &context in contexts {
            if !unique.iter().any(|seen| Arc::ptr_eq(&seen.inner, &context.inner)) {
                unique.push(context);
            }
        }
        // always lock in address order
        unique.sort_by_key(|context| Arc::as_ptr(&context.inner) as usize);

        let _guards: Vec<_> = unique
            .iter()
            .map(|context| context.inner.save_lock.lock())
            .collect();
        for context in &unique {
            context.ensure_active()?;
        }

        let batches: Vec<Box<dyn PendingBatch>> = unique
            .iter()
            .flat_map(|context| context.pending_batches())
            .collect();
        let pending: usize = batches.iter().map(|batch| batch.len()).sum();
        debug!(contexts = unique.len(), pending, "Saving changes");

        for batch in &batches {
            batch.validate()?;
        }

        let written: usize = batches.into_iter().map(|batch| batch.apply()).sum();
        debug!(contexts = unique.len(), written, "Saved changes");
        Ok(written)
    }

    fn pending_batches(&self) -> Vec<Box<dyn PendingBatch>> {
        self.inner
            .sets
            .read()
            .values()
            .filter(|entry| entry.tracked.pending_len() > 0)
            .map(|entry| {
                trace!(
                    context = %self.inner.name,
                    entity = entry.tracked.entity_name(),
                    "Collecting pending changes"
                );
                entry.tracked.pending_batch()
            })
            .collect()
    }

    /// Dispose the context: every later operation fails with
    /// [`StoreError::Disposed`]. Disposing twice is a no-op.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        trace!(context = %self.inner.name, "Disposing context");
        let _guard = self.inner.save_lock.lock();
        let mut sets = self.inner.sets.write();
        for entry in sets.values() {
            entry.tracked.clear();
        }
        sets.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Number of saved rows of `T`
    pub fn len<T: Entity>(&self) -> StoreResult<usize> {
        Ok(self.set::<T>()?.len())
    }
}

/// Saved rows of one set, checked against disposal on every scan
struct ContextRows<T: Entity> {
    context: MemoryContext,
    set: Arc<EntitySet<T>>,
}

impl<T: Entity> RowSource<T> for ContextRows<T> {
    fn scan(&self, visit: &mut dyn FnMut(&T)) -> StoreResult<()> {
        self.context.ensure_active()?;
        self.set.scan(visit);
        Ok(())
    }
}
