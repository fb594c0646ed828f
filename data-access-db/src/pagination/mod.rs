//! Offset pagination over queryable sources.
//!
//! A pagination call validates its inputs, counts the source once, computes
//! the page window, fetches that window once and materializes it into one of
//! the paged collection shapes.

pub mod extensions;
pub mod materialize;
pub mod page_computer;
pub mod page_request;
pub mod paged_collection;
pub mod queryable;

// Re-exports
pub use extensions::*;
pub use materialize::*;
pub use page_computer::*;
pub use page_request::*;
pub use paged_collection::*;
pub use queryable::*;
