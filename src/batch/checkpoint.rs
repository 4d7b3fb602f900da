use crate::ScoutError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persisted progress marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub last_processed_index: usize,
}

/// Single-writer checkpoint file
///
/// The file is replaced as a whole on every save (write to a sibling temp
/// file, then rename), so a crash never leaves a half-written marker.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the last processed index
    ///
    /// A missing file is index 0. Unparseable content is logged and also
    /// treated as 0. Any other read failure is an error.
    pub fn load(&self) -> Result<usize, ScoutError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(ScoutError::CheckpointRead {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        match serde_json::from_str::<CheckpointState>(&content) {
            Ok(state) => Ok(state.last_processed_index),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable checkpoint {}: {}",
                    self.path.display(),
                    e
                );
                Ok(0)
            }
        }
    }

    /// Persists the index of the next record to process
    pub fn save(&self, last_processed_index: usize) -> Result<(), ScoutError> {
        let write_error = |source: std::io::Error| ScoutError::CheckpointWrite {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_error)?;
            }
        }

        let body = serde_json::to_string(&CheckpointState {
            last_processed_index,
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, body).map_err(write_error)?;
        std::fs::rename(&tmp, &self.path).map_err(write_error)?;

        tracing::debug!("Checkpoint at {}", last_processed_index);
        Ok(())
    }

    /// Deletes the checkpoint so the next run starts at 0
    pub fn clear(&self) -> Result<(), ScoutError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ScoutError::CheckpointWrite {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}
