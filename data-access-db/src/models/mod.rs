pub mod identifiable;

// Re-exports
pub use identifiable::*;
