//! Persistent identity store.
//!
//! Maps device name → platform client id in a JSON file so later runs can
//! restore the identity and skip onboarding entirely. Credentials are never
//! written here; persistence covers only the public identity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

/// Errors from identity store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File-backed store for onboarded identities.
///
/// Identities are cached in memory and persisted to a JSON file. The path
/// is supplied by the caller; config-directory resolution stays outside
/// this crate.
pub struct IdentityStore {
    path: PathBuf,
    ids: RwLock<HashMap<String, String>>,
}

impl IdentityStore {
    /// Creates a store, loading existing identities from disk.
    pub fn new(path: PathBuf) -> Result<Self, StoreError> {
        let ids = load_ids(&path)?;
        Ok(Self {
            path,
            ids: RwLock::new(ids),
        })
    }

    /// Returns the stored client id for a device, if any.
    pub fn client_id(&self, device_name: &str) -> Option<String> {
        self.ids.read().unwrap().get(device_name).cloned()
    }

    /// Saves an onboarded identity.
    pub fn save(&self, device_name: &str, client_id: &str) -> Result<(), StoreError> {
        {
            let mut map = self.ids.write().unwrap();
            map.insert(device_name.to_string(), client_id.to_string());
        }
        self.persist()
    }

    /// Removes a stored identity.
    pub fn remove(&self, device_name: &str) -> Result<(), StoreError> {
        {
            let mut map = self.ids.write().unwrap();
            map.remove(device_name);
        }
        self.persist()
    }

    /// Returns all stored device names.
    pub fn device_names(&self) -> Vec<String> {
        self.ids.read().unwrap().keys().cloned().collect()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let map = self.ids.read().unwrap();
        let json = serde_json::to_string_pretty(&*map)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!("persisted {} identit(ies) to {:?}", map.len(), self.path);
        Ok(())
    }
}

fn load_ids(path: &Path) -> Result<HashMap<String, String>, StoreError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let data = std::fs::read_to_string(path)?;
    let ids: HashMap<String, String> = serde_json::from_str(&data)?;
    debug!("loaded {} identit(ies) from {:?}", ids.len(), path);
    Ok(ids)
}
