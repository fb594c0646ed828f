//! Repository and unit-of-work implementations over a [`crate::store::MemoryContext`].

pub mod read_only_repository_impl;
pub mod registry;
pub mod repository_impl;
pub mod unit_of_work_impl;

// Re-exports
pub use read_only_repository_impl::*;
pub use registry::*;
pub use repository_impl::*;
pub use unit_of_work_impl::*;
