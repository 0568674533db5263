use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use courier_common::internal;
use tokio::{fs, io::AsyncWriteExt};

use crate::{Result, SentState, SentStateStore, StateError, WriteMode};

/// File-backed sent-state
///
/// The file is UTF-8 text with one identifier per line, no header and no
/// escaping. It is read with best-effort trimming.
///
/// # Atomicity
/// Overwrites go through a sibling temporary file that is renamed over the
/// target once fully written, so the previous history stays intact until
/// the complete replacement is on disk.
#[derive(Debug, Clone)]
pub struct FileSentStateStore {
    path: PathBuf,
}

impl FileSentStateStore {
    /// Create a new `FileSentStateStore` builder
    #[must_use]
    pub fn builder() -> FileSentStateStoreBuilder {
        FileSentStateStoreBuilder::default()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate a sent-state path
    ///
    /// - Rejects paths containing `..` (directory traversal)
    /// - Rejects paths inside sensitive system directories
    /// - Requires a file name component
    fn validate_path(path: &Path) -> Result<()> {
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(StateError::InvalidPath(format!(
                "path cannot contain '..' components: {}",
                path.display()
            )));
        }

        let sensitive_prefixes = [
            "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev",
        ];

        if let Some(prefix) = sensitive_prefixes.iter().find(|p| path.starts_with(p)) {
            return Err(StateError::InvalidPath(format!(
                "path cannot be in system directory {prefix}: {}",
                path.display()
            )));
        }

        if path.file_name().is_none() {
            return Err(StateError::InvalidPath(format!(
                "path must name a file: {}",
                path.display()
            )));
        }

        Ok(())
    }

    fn temporary_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn overwrite(&self, state: &SentState) -> Result<usize> {
        let temporary = self.temporary_path();

        if let Err(e) = fs::write(&temporary, state.render()).await {
            let _ = fs::remove_file(&temporary).await;
            return Err(e.into());
        }
        fs::rename(&temporary, &self.path).await?;

        Ok(state.len())
    }

    async fn append(&self, state: &SentState) -> Result<usize> {
        let existing = match self.load().await {
            Ok(existing) => existing,
            Err(StateError::Io(e)) if e.kind() == ErrorKind::NotFound => SentState::new(),
            Err(e) => return Err(e),
        };

        let fresh: SentState = state.iter().filter(|id| !existing.contains(id)).collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(fresh.render().as_bytes()).await?;
        file.flush().await?;

        Ok(fresh.len())
    }
}

#[async_trait]
impl SentStateStore for FileSentStateStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<SentState> {
        internal!("Opening sent-state at {}", self.path.display());

        let contents = fs::read_to_string(&self.path).await?;
        Ok(SentState::parse(&contents))
    }

    async fn save(&self, state: &SentState, mode: WriteMode) -> Result<usize> {
        state.validate()?;
        self.ensure_parent().await?;

        let written = match mode {
            WriteMode::Overwrite => self.overwrite(state).await?,
            WriteMode::Append => self.append(state).await?,
        };

        internal!(
            level = INFO,
            "Saved {written} identifiers to sent-state at {}",
            self.path.display()
        );

        Ok(written)
    }
}

/// Builder for [`FileSentStateStore`]
#[derive(Debug, Default)]
pub struct FileSentStateStoreBuilder {
    path: Option<PathBuf>,
}

impl FileSentStateStoreBuilder {
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Build the store, validating the path.
    ///
    /// # Errors
    /// If no path was given or the path is rejected by validation.
    pub fn build(self) -> Result<FileSentStateStore> {
        let path = self
            .path
            .ok_or_else(|| StateError::InvalidPath("no path configured".to_string()))?;
        FileSentStateStore::validate_path(&path)?;
        Ok(FileSentStateStore { path })
    }
}
