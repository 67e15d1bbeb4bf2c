//! In-memory adapters for tests and embedders.

pub mod tree_store;

pub use tree_store::InMemoryTreeStore;
