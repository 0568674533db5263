//! Backing store implementations for the sent-state
//!
//! - `file`: one identifier per line in a UTF-8 text file (production)
//! - `memory`: in-process storage for tests and dry runs

pub mod file;
pub mod memory;

pub use file::{FileSentStateStore, FileSentStateStoreBuilder};
pub use memory::MemorySentStateStore;
