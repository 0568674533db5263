use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{Result, SentState, SentStateStore, StateError, WriteMode};

/// In-memory sent-state
///
/// Used for dry runs, where nothing may be remembered once the process
/// exits, and in tests. Saves can be made to fail on demand to exercise the
/// persistence-failure path.
#[derive(Debug, Clone, Default)]
pub struct MemorySentStateStore {
    stored: Arc<RwLock<SentState>>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemorySentStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `identifiers`, as if written by a prior run.
    #[must_use]
    pub fn with_identifiers<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        *store
            .stored
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = identifiers.into_iter().collect();
        store
    }

    /// Snapshot of the stored identifiers, in stored order.
    #[must_use]
    pub fn identifiers(&self) -> Vec<String> {
        self.stored
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .map(str::to_string)
            .collect()
    }

    /// Make every following save fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of save calls made, successful or not.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentStateStore for MemorySentStateStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<SentState> {
        Ok(self.stored.read()?.clone())
    }

    async fn save(&self, state: &SentState, mode: WriteMode) -> Result<usize> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        state.validate()?;

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StateError::Internal(
                "memory store configured to fail saves".to_string(),
            ));
        }

        let mut stored = self.stored.write()?;
        let written = match mode {
            WriteMode::Overwrite => {
                *stored = state.clone();
                state.len()
            }
            WriteMode::Append => {
                let before = stored.len();
                stored.extend(state.iter().map(str::to_string));
                stored.len() - before
            }
        };
        drop(stored);

        Ok(written)
    }
}
