//! Trusted economic actor - a peer whose markers the cluster follows

use super::EconomicActor;
use ecluster_common::{Address, Tangle, TrustWeight};
use std::collections::HashMap;

/// Last marker seen from a peer for one tangle
#[derive(Debug, Clone, Copy, PartialEq)]
struct Observation {
    confidence: f64,
    index: u64,
}

/// Passive record of a trusted peer
#[derive(Debug, Clone)]
pub struct TrustedEconomicActor {
    address: Address,
    trust: TrustWeight,
    observations: HashMap<Tangle, Observation>,
}

impl TrustedEconomicActor {
    pub fn new(address: Address, trust: TrustWeight) -> Self {
        Self {
            address,
            trust,
            observations: HashMap::new(),
        }
    }

    pub fn trust(&self) -> TrustWeight {
        self.trust
    }

    pub fn set_trust(&mut self, trust: TrustWeight) {
        self.trust = trust;
    }

    /// Record a marker. Older markers (lower index) than the one held are ignored.
    pub fn observe(&mut self, tangle: Tangle, confidence: f64, index: u64) -> bool {
        match self.observations.get(&tangle) {
            Some(held) if held.index >= index => false,
            _ => {
                self.observations
                    .insert(tangle, Observation { confidence, index });
                true
            }
        }
    }

    /// Marked tangles with their last seen confidence
    pub fn markers(&self) -> impl Iterator<Item = (&Tangle, f64)> {
        self.observations
            .iter()
            .map(|(tangle, observation)| (tangle, observation.confidence))
    }
}

impl EconomicActor for TrustedEconomicActor {
    fn address(&self) -> Address {
        self.address
    }

    fn marked_tangles(&self) -> Vec<Tangle> {
        self.observations.keys().copied().collect()
    }

    fn tangle_confidence(&self, tangle: &Tangle) -> Option<f64> {
        self.observations.get(tangle).map(|o| o.confidence)
    }
}
