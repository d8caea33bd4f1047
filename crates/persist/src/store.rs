//! Slot-addressed container storage.
//!
//! One file per save slot under the host-provided persistent-data root:
//! `<root>/slot<N>.modsave`, holding a JSON array of tenant payloads with a
//! trailing newline. Every save fully replaces the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors from container-level persistence.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("container encode error: {0}")]
    Encode(serde_json::Error),
    #[error("container decode error: {0}")]
    Decode(serde_json::Error),
}

/// One tenant's contribution to a slot file: its key plus an opaque payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantPayload {
    pub tenant_key: String,
    pub payload: String,
}

/// Container store rooted at one persistent-data directory.
#[derive(Debug, Clone)]
pub struct SlotStore {
    root: PathBuf,
}

impl SlotStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the container file for `slot`.
    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.root.join(format!("slot{slot}.modsave"))
    }

    /// Write the container for `slot`, replacing any previous content.
    pub fn write(&self, slot: u32, payloads: &[TenantPayload]) -> Result<PathBuf, PersistError> {
        fs::create_dir_all(&self.root)?;
        let mut encoded =
            serde_json::to_string_pretty(payloads).map_err(PersistError::Encode)?;
        encoded.push('\n');
        let path = self.slot_path(slot);
        fs::write(&path, encoded)?;
        Ok(path)
    }

    /// Read the container for `slot`.
    ///
    /// `Ok(None)` means the file does not exist: a fresh slot, not an error.
    /// A file that exists but cannot be read or decoded is an error.
    pub fn read(&self, slot: u32) -> Result<Option<Vec<TenantPayload>>, PersistError> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        let payloads = serde_json::from_str(&raw).map_err(PersistError::Decode)?;
        Ok(Some(payloads))
    }

    pub fn exists(&self, slot: u32) -> bool {
        self.slot_path(slot).exists()
    }

    /// Remove the container for `slot`, if present.
    pub fn delete(&self, slot: u32) -> Result<(), PersistError> {
        let path = self.slot_path(slot);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
