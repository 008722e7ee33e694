//! Trust list persistence
//!
//! Stored as `{"trusted": [{"address": "<hex>", "trust": 0.5}, ...]}`.
//! Loading replays `set_trust` in file order, so the last entry for an
//! address wins.

use crate::service::EcNode;
use ecluster_common::{Address, EcError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustEntry {
    pub address: Address,
    pub trust: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub trusted: Vec<TrustEntry>,
}

/// JSON file holding the trust list
pub struct TrustStore {
    path: PathBuf,
}

impl TrustStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the node's current trust list
    pub fn store(&self, node: &EcNode) -> Result<()> {
        let state = PersistedState {
            trusted: node
                .trusted_actors()
                .into_iter()
                .map(|(address, trust)| TrustEntry {
                    address,
                    trust: trust.value(),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&state)?;
        std::fs::write(&self.path, json).map_err(|e| {
            EcError::Storage(format!("could not write {}: {e}", self.path.display()))
        })?;
        info!(path = %self.path.display(), entries = state.trusted.len(), "Trust list stored");
        Ok(())
    }

    /// Replay the stored trust list into `node`; a missing file is not an error
    pub fn load(&self, node: &EcNode) -> Result<usize> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No trust list to load");
            return Ok(0);
        }
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            EcError::Storage(format!("could not read {}: {e}", self.path.display()))
        })?;
        let state: PersistedState = serde_json::from_str(&json)?;
        for entry in &state.trusted {
            node.set_trust(entry.address, entry.trust)?;
        }
        info!(path = %self.path.display(), entries = state.trusted.len(), "Trust list loaded");
        Ok(state.trusted.len())
    }
}
