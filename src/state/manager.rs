//! Shared, optionally file-backed bookmark store

use super::types::{Bookmark, State};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Bookmarks for one run
///
/// Clones share the same state. A manager created from a path writes back to
/// it on [`StateManager::save`]; inline and in-memory managers never touch
/// the filesystem.
#[derive(Debug, Clone)]
pub struct StateManager {
    file: Option<PathBuf>,
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Empty state that will be saved to `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: Some(path.as_ref().to_path_buf()),
            state: Arc::default(),
        }
    }

    /// Empty state that is never persisted
    pub fn in_memory() -> Self {
        Self::with_state(State::new())
    }

    /// Seeded state that is never persisted
    pub fn with_state(state: State) -> Self {
        Self {
            file: None,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Load `path` if it exists and save back to it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = match std::fs::read_to_string(path) {
            Ok(contents) => parse_state(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::new(),
            Err(e) => {
                return Err(Error::state(format!(
                    "Failed to read state file '{}': {e}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            file: Some(path.to_path_buf()),
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// State passed inline, e.g. `--state-json`
    pub fn from_json(json: &str) -> Result<Self> {
        parse_state(json).map(Self::with_state)
    }

    /// Write the state file through a temporary sibling and a rename
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };

        let contents = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?
        };

        let staging = path.with_extension("tmp");
        tokio::fs::write(&staging, contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write '{}': {e}", staging.display())))?;
        tokio::fs::rename(&staging, path)
            .await
            .map_err(|e| Error::state(format!("Failed to replace '{}': {e}", path.display())))
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Bookmark for `stream`, if any
    pub async fn get_bookmark(&self, stream: &str) -> Option<Bookmark> {
        self.state.read().await.get_bookmark(stream).cloned()
    }

    /// Move a bookmark forward; returns whether it changed
    pub async fn advance_bookmark(&self, stream: &str, replication_key: &str, value: &str) -> bool {
        self.state
            .write()
            .await
            .advance_bookmark(stream, replication_key, value)
    }

    /// Backing file, `None` for in-memory state
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Whether [`StateManager::save`] is a no-op
    pub fn is_in_memory(&self) -> bool {
        self.file.is_none()
    }
}

fn parse_state(contents: &str) -> Result<State> {
    if contents.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(contents).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}
