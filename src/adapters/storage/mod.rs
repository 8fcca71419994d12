//! Storage Adapters
//!
//! Implementations of the DocumentStore and ConnectorStore ports.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::{MemoryStore, StoreSnapshot};
