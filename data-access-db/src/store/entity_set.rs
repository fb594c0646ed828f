use std::collections::HashSet;
use std::sync::Arc;

use data_access_api::{StoreError, StoreResult};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::models::Entity;

/// A change queued against an entity set until the next save
#[derive(Debug, Clone)]
pub(crate) enum Change<T: Entity> {
    Added(T),
    Modified(T),
    Removed(T::Id),
}

impl<T: Entity> Change<T> {
    fn id(&self) -> T::Id {
        match self {
            Change::Added(entity) | Change::Modified(entity) => entity.get_id(),
            Change::Removed(id) => id.clone(),
        }
    }
}

/// Committed rows of one entity type plus the changes pending against them.
///
/// Rows keep insertion order; an update replaces a row in place.
pub(crate) struct EntitySet<T: Entity> {
    rows: RwLock<IndexMap<T::Id, T>>,
    pending: Mutex<Vec<Change<T>>>,
}

impl<T: Entity> EntitySet<T> {
    pub(crate) fn new() -> Self {
        Self {
            rows: RwLock::new(IndexMap::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn track(&self, change: Change<T>) {
        self.pending.lock().push(change);
    }

    pub(crate) fn track_all(&self, changes: impl IntoIterator<Item = Change<T>>) {
        self.pending.lock().extend(changes);
    }

    /// Latest state of `id`: pending changes first, then committed rows
    pub(crate) fn find(&self, id: &T::Id) -> Option<T> {
        {
            let pending = self.pending.lock();
            if let Some(change) = pending.iter().rev().find(|change| &change.id() == id) {
                return match change {
                    Change::Added(entity) | Change::Modified(entity) => Some(entity.clone()),
                    Change::Removed(_) => None,
                };
            }
        }
        self.rows.read().get(id).cloned()
    }

    pub(crate) fn scan(&self, visit: &mut dyn FnMut(&T)) {
        self.rows.read().values().for_each(visit);
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.read().len()
    }
}

/// Type-erased view of an entity set used by contexts when saving.
pub(crate) trait TrackedSet: Send + Sync {
    fn entity_name(&self) -> &'static str;

    fn pending_len(&self) -> usize;

    fn discard(&self);

    /// Snapshot of the pending changes; they stay queued until the batch is applied
    fn pending_batch(&self) -> Box<dyn PendingBatch>;

    /// Drop committed rows and pending changes
    fn clear(&self);
}

/// The changes pending in a set when a save started.
///
/// Dropping a batch without applying it leaves the set untouched.
pub(crate) trait PendingBatch: Send {
    fn len(&self) -> usize;

    /// Check the batch against the committed rows without touching them
    fn validate(&self) -> StoreResult<()>;

    /// Write the batch to the committed rows, then dequeue its changes.
    /// Returns the number of state entries written.
    fn apply(self: Box<Self>) -> usize;
}

/// Shared handle implementing [`TrackedSet`] for one entity type
pub(crate) struct SetHandle<T: Entity>(pub(crate) Arc<EntitySet<T>>);

impl<T: Entity> TrackedSet for SetHandle<T> {
    fn entity_name(&self) -> &'static str {
        T::entity_name()
    }

    fn pending_len(&self) -> usize {
        self.0.pending.lock().len()
    }

    fn discard(&self) {
        self.0.pending.lock().clear();
    }

    fn pending_batch(&self) -> Box<dyn PendingBatch> {
        let changes = self.0.pending.lock().clone();
        Box::new(Batch {
            set: Arc::clone(&self.0),
            changes,
        })
    }

    fn clear(&self) {
        self.0.pending.lock().clear();
        self.0.rows.write().clear();
    }
}

struct Batch<T: Entity> {
    set: Arc<EntitySet<T>>,
    changes: Vec<Change<T>>,
}

impl<T: Entity> PendingBatch for Batch<T> {
    fn len(&self) -> usize {
        self.changes.len()
    }

    fn validate(&self) -> StoreResult<()> {
        let rows = self.set.rows.read();
        let mut added: HashSet<T::Id> = HashSet::new();
        let mut removed: HashSet<T::Id> = HashSet::new();
        let exists = |id: &T::Id, added: &HashSet<T::Id>, removed: &HashSet<T::Id>| {
            added.contains(id) || (rows.contains_key(id) && !removed.contains(id))
        };

        for change in &self.changes {
            let id = change.id();
            match change {
                Change::Added(_) => {
                    if exists(&id, &added, &removed) {
                        return Err(StoreError::DuplicateKey {
                            entity: T::entity_name(),
                            key: format!("{id:?}"),
                        });
                    }
                    removed.remove(&id);
                    added.insert(id);
                }
                Change::Modified(_) => {
                    if !exists(&id, &added, &removed) {
                        return Err(StoreError::EntityNotFound {
                            entity: T::entity_name(),
                            key: format!("{id:?}"),
                        });
                    }
                }
                Change::Removed(_) => {
                    if !exists(&id, &added, &removed) {
                        return Err(StoreError::EntityNotFound {
                            entity: T::entity_name(),
                            key: format!("{id:?}"),
                        });
                    }
                    added.remove(&id);
                    removed.insert(id);
                }
            }
        }
        Ok(())
    }

    fn apply(self: Box<Self>) -> usize {
        let written = self.changes.len();
        {
            let mut rows = self.set.rows.write();
            for change in self.changes {
                match change {
                    Change::Added(entity) | Change::Modified(entity) => {
                        rows.insert(entity.get_id(), entity);
                    }
                    Change::Removed(id) => {
                        rows.shift_remove(&id);
                    }
                }
            }
        }
        // the batch is the oldest part of the queue; later changes stay pending
        let mut pending = self.set.pending.lock();
        let applied = written.min(pending.len());
        pending.drain(..applied);
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identifiable;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        label: &'static str,
    }

    impl Identifiable for Item {
        type Id = u32;

        fn get_id(&self) -> u32 {
            self.id
        }
    }

    fn item(id: u32, label: &'static str) -> Item {
        Item { id, label }
    }

    fn save(handle: &SetHandle<Item>) -> StoreResult<usize> {
        let batch = handle.pending_batch();
        batch.validate()?;
        Ok(batch.apply())
    }

    #[test]
    fn test_apply_keeps_row_positions() {
        let handle = SetHandle(Arc::new(EntitySet::new()));
        handle.0.track_all([
            Change::Added(item(1, "a")),
            Change::Added(item(2, "b")),
            Change::Added(item(3, "c")),
        ]);
        assert_eq!(save(&handle).unwrap(), 3);

        handle.0.track(Change::Modified(item(2, "B")));
        handle.0.track(Change::Removed(1));
        assert_eq!(save(&handle).unwrap(), 2);

        let mut labels = Vec::new();
        handle.0.scan(&mut |row| labels.push(row.label));
        assert_eq!(labels, vec!["B", "c"]);
    }

    #[test]
    fn test_invalid_batch_stays_pending() {
        let handle = SetHandle(Arc::new(EntitySet::new()));
        handle.0.track(Change::Added(item(1, "a")));
        save(&handle).unwrap();

        handle.0.track(Change::Added(item(2, "b")));
        handle.0.track(Change::Added(item(1, "again")));
        let err = save(&handle).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { entity: "Item", .. }));
        assert_eq!(handle.pending_len(), 2);
        assert_eq!(handle.0.len(), 1);

        handle.discard();
        handle.0.track(Change::Modified(item(9, "missing")));
        assert!(matches!(save(&handle).unwrap_err(), StoreError::EntityNotFound { .. }));
    }

    #[test]
    fn test_entity_stays_visible_while_saving() {
        let handle = SetHandle(Arc::new(EntitySet::new()));
        handle.0.track(Change::Added(item(1, "a")));

        let batch = handle.pending_batch();
        batch.validate().unwrap();
        handle.0.track(Change::Added(item(2, "b")));
        assert_eq!(handle.0.find(&1), Some(item(1, "a")));
        assert_eq!(handle.pending_len(), 2);

        assert_eq!(batch.apply(), 1);
        assert_eq!(handle.0.find(&1), Some(item(1, "a")));
        assert_eq!(handle.0.find(&2), Some(item(2, "b")));
        assert_eq!(handle.pending_len(), 1);
        assert_eq!(handle.0.len(), 1);
    }

    #[test]
    fn test_remove_then_add_same_key() {
        let handle = SetHandle(Arc::new(EntitySet::new()));
        handle.0.track(Change::Added(item(1, "a")));
        save(&handle).unwrap();

        handle.0.track(Change::Removed(1));
        handle.0.track(Change::Added(item(1, "fresh")));
        assert_eq!(save(&handle).unwrap(), 2);
        assert_eq!(handle.0.find(&1), Some(item(1, "fresh")));
    }

    #[test]
    fn test_find_prefers_pending_changes() {
        let set = EntitySet::new();
        set.track(Change::Added(item(1, "a")));
        assert_eq!(set.find(&1), Some(item(1, "a")));

        set.track(Change::Removed(1));
        assert_eq!(set.find(&1), None);
        assert_eq!(set.find(&2), None);
    }
}
