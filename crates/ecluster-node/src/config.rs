//! Node configuration

use anyhow::Result;
use ecluster_common::DEFAULT_CONFIRMATION_CONFIDENCE;
use ecluster_core::ActorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Node service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Interval between two ticks of every owned actor
    pub tick_interval: Duration,
    /// Tuning applied to newly created actors
    pub actor: ActorConfig,
    /// Cluster confidence above which a value transaction is settled
    pub confirmation_confidence: f64,
    /// Merkle depth of the bootstrap actor's signing key
    pub merkle_depth: u32,
    /// Trust list file
    pub persistence_path: PathBuf,
    /// Hex seed of the bootstrap actor; random when unset
    pub actor_seed: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            actor: ActorConfig::default(),
            confirmation_confidence: DEFAULT_CONFIRMATION_CONFIDENCE,
            merkle_depth: 10,
            persistence_path: PathBuf::from("persistence.json"),
            actor_seed: None,
        }
    }
}

impl NodeConfig {
    /// Load configuration from the environment (and `.env` if present)
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("EC_TICK_INTERVAL_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                cfg.tick_interval = Duration::from_millis(ms);
            }
        }

        // Actor tuning
        if let Ok(val) = std::env::var("EC_AGGRESSIVITY") {
            if let Ok(v) = val.parse() {
                cfg.actor.aggressivity = v;
            }
        }
        if let Ok(val) = std::env::var("EC_CONSERVATIVITY") {
            if let Ok(v) = val.parse() {
                cfg.actor.conservativity = v;
            }
        }
        if let Ok(val) = std::env::var("EC_SUBMIT_TIMEOUT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                cfg.actor.submit_timeout = Duration::from_millis(ms);
            }
        }

        if let Ok(val) = std::env::var("EC_CONFIRMATION_CONFIDENCE") {
            if let Ok(v) = val.parse() {
                cfg.confirmation_confidence = v;
            }
        }
        if let Ok(val) = std::env::var("EC_MERKLE_DEPTH") {
            if let Ok(v) = val.parse() {
                cfg.merkle_depth = v;
            }
        }
        if let Ok(path) = std::env::var("EC_PERSISTENCE_PATH") {
            cfg.persistence_path = PathBuf::from(path);
        }
        if let Ok(seed) = std::env::var("EC_ACTOR_SEED") {
            cfg.actor_seed = Some(seed);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.actor.conservativity.is_finite() && self.actor.conservativity >= 1.0,
            "EC_CONSERVATIVITY must be at least 1, got {}",
            self.actor.conservativity
        );
        anyhow::ensure!(
            self.actor.aggressivity.is_finite() && self.actor.aggressivity >= 0.0,
            "EC_AGGRESSIVITY must be non-negative, got {}",
            self.actor.aggressivity
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.confirmation_confidence),
            "EC_CONFIRMATION_CONFIDENCE must lie in [0, 1], got {}",
            self.confirmation_confidence
        );
        anyhow::ensure!(
            !self.tick_interval.is_zero(),
            "EC_TICK_INTERVAL_MS must be positive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = NodeConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.confirmation_confidence, 0.95);
        assert_eq!(cfg.actor.conservativity, 20.0);
    }

    #[test]
    fn test_rejects_overshooting_damping() {
        let mut cfg = NodeConfig::default();
        cfg.actor.conservativity = 0.5;
        assert!(cfg.validate().is_err());
    }
}
