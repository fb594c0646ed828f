pub mod factory;
pub mod read_only_repository;
pub mod unit_of_work;
pub mod write_repository;

// Re-exports
pub use factory::*;
pub use read_only_repository::*;
pub use unit_of_work::*;
pub use write_repository::*;
