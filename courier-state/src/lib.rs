pub mod backends;
pub mod config;
pub mod error;
pub mod state;
pub mod r#trait;

pub use backends::{FileSentStateStore, FileSentStateStoreBuilder, MemorySentStateStore};
pub use config::{StateConfig, WriteMode};
pub use error::{Result, StateError};
pub use state::SentState;
pub use r#trait::SentStateStore;
