pub mod memory;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod store;

pub use memory::*;
pub use models::*;
pub use pagination::*;
pub use repository::*;
pub use store::*;

#[cfg(test)]
pub mod test_utils;
