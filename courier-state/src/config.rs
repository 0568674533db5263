use std::{path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{FileSentStateStore, MemorySentStateStore, SentStateStore};

/// How [`SentStateStore::save`] treats the identifiers already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    /// Replace the stored list with the given state.
    #[default]
    Overwrite,
    /// Keep the stored list and add identifiers it does not contain yet.
    Append,
}

/// Configuration for the sent-state store
///
/// # Examples
///
/// File-backed state in RON config:
/// ```ron
/// state: File(
///     path: "data/sent.txt",
///     mode: Overwrite,
/// ),
/// ```
///
/// In-memory state, forgotten when the process exits:
/// ```ron
/// state: Memory,
/// ```
#[derive(Debug, Clone, Deserialize)]
pub enum StateConfig {
    /// Plain text file, one identifier per line
    File {
        path: PathBuf,
        #[serde(default)]
        mode: WriteMode,
    },
    /// Process-local storage (dry runs and testing)
    Memory,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self::File {
            path: PathBuf::from("data/sent.txt"),
            mode: WriteMode::default(),
        }
    }
}

impl StateConfig {
    /// The write mode the store should be saved with.
    #[must_use]
    pub const fn mode(&self) -> WriteMode {
        match self {
            Self::File { mode, .. } => *mode,
            Self::Memory => WriteMode::Overwrite,
        }
    }

    /// Convert the configuration into a concrete store.
    ///
    /// # Errors
    /// If the configured file path is rejected by validation.
    pub fn into_store(self) -> crate::Result<Arc<dyn SentStateStore>> {
        match self {
            Self::File { path, .. } => Ok(Arc::new(
                FileSentStateStore::builder().path(path).build()?,
            )),
            Self::Memory => Ok(Arc::new(MemorySentStateStore::new())),
        }
    }
}
