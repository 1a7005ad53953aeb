//! Checkpoint sidecar file
//!
//! The checkpoint holds the decimal index of the next row to process. It is
//! rewritten after every finished task and removed once a run has nothing
//! left to do.

use crate::config::TableConfig;
use crate::PersistError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors reading an existing checkpoint. Callers treat these as "no checkpoint".
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid checkpoint content {0:?}")]
    Parse(String),
}

/// Reads and writes the checkpoint for one table
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store located next to the configured table
    pub fn for_table(config: &TableConfig) -> Self {
        Self::new(config.checkpoint_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Returns the stored row index, or `None` when there is no checkpoint
    pub fn read(&self) -> Result<Option<usize>, CheckpointError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        content
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| CheckpointError::Parse(content))
    }

    /// Persists `next_index` as the next row to process
    pub fn write(&self, next_index: usize) -> Result<(), PersistError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        write!(tmp, "{}", next_index)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path).map_err(|e| PersistError::Rename {
            path: self.path.display().to_string(),
            source: e.error,
        })?;
        Ok(())
    }

    /// Deletes the checkpoint; a missing file is not an error
    pub fn clear(&self) -> Result<(), PersistError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
