use async_trait::async_trait;
use courier_common::tracing::warn;

use crate::{Result, SentState, WriteMode};

/// Durable storage for the set of identifiers that have already been contacted.
///
/// A store is loaded once when a run starts and saved once when it ends. It
/// is assumed to have a single writer; concurrent runs against the same store
/// must be prevented by the operator.
#[async_trait]
pub trait SentStateStore: Send + Sync + std::fmt::Debug {
    /// Human readable location, used in log messages.
    fn location(&self) -> String;

    /// Read the persisted identifiers.
    ///
    /// # Errors
    /// If the underlying storage is missing or cannot be read.
    async fn load(&self) -> Result<SentState>;

    /// Persist `state`, returning how many identifiers were written.
    ///
    /// With [`WriteMode::Overwrite`] the stored list is replaced by `state`.
    /// With [`WriteMode::Append`] only identifiers not yet stored are added.
    ///
    /// # Errors
    /// If an identifier cannot be represented or the write fails. A failed
    /// write never leaves a partially written replacement behind.
    async fn save(&self, state: &SentState, mode: WriteMode) -> Result<usize>;

    /// Load the persisted identifiers, treating any failure as "no history".
    async fn load_or_default(&self) -> SentState {
        match self.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    location = %self.location(),
                    error = %e,
                    "Cannot read sent-state, continuing as if nothing was sent before"
                );
                SentState::new()
            }
        }
    }
}
