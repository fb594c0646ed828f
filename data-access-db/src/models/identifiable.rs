use std::fmt::Debug;
use std::hash::Hash;

/// Trait for entities that can be uniquely identified by a key
pub trait Identifiable {
    /// The primary key type of the entity
    type Id: Eq + Hash + Clone + Debug + Send + Sync + 'static;

    /// Returns the unique identifier of the entity
    fn get_id(&self) -> Self::Id;
}

/// Anything a store can track: identifiable, cloneable and shareable across tasks.
pub trait Entity: Identifiable + Clone + Send + Sync + 'static {
    /// Short type name used in diagnostics and logs
    fn entity_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

impl<T> Entity for T where T: Identifiable + Clone + Send + Sync + 'static {}
