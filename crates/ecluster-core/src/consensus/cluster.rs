//! Economic Cluster - trust-weighted aggregation of peer markers
//!
//! For a transaction `tx`, each trusted actor that marked at least one tangle
//! whose past cone contains `tx` has an opinion: the highest confidence among
//! those markers. Then
//!
//! ```text
//! turnout    = Σ w(opinionated) / Σ w(all)
//! approval   = Σ w·c(opinionated) / Σ w(opinionated)
//! confidence = turnout · approval = Σ w·c(opinionated) / Σ w(all)
//! ```
//!
//! Silent peers count against `confidence`, so a vote from a small share of
//! the trust weight cannot settle a transaction on its own.
//!
//! Membership changes take a write lock; aggregation only reads.

use crate::actor::{EconomicActor, Marker, TrustedEconomicActor};
use crate::ledger::{ConeCache, HostLedger};
use ecluster_common::{Address, Result, Tangle, Transaction, TransactionRef, TrustWeight};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a trust update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Added,
    Updated,
    Removed,
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default)]
struct Opinions {
    total_weight: f64,
    opinionated_weight: f64,
    weighted_confidence: f64,
}

/// Set of trusted peers and their markers
pub struct EconomicCluster {
    ledger: Arc<dyn HostLedger>,
    actors: RwLock<HashMap<Address, TrustedEconomicActor>>,
    cones: ConeCache,
}

impl EconomicCluster {
    pub fn new(ledger: Arc<dyn HostLedger>) -> Self {
        Self {
            ledger,
            actors: RwLock::new(HashMap::new()),
            cones: ConeCache::new(),
        }
    }

    /// Insert a peer, replacing any previous record for its address
    pub fn add_actor(&self, actor: TrustedEconomicActor) {
        if actor.trust().is_zero() {
            self.remove_actor(&actor.address());
            return;
        }
        info!(address = %actor.address().short(), trust = %actor.trust(), "Trusted actor added");
        self.actors.write().insert(actor.address(), actor);
    }

    pub fn remove_actor(&self, address: &Address) -> Option<TrustedEconomicActor> {
        let removed = self.actors.write().remove(address);
        if removed.is_some() {
            info!(address = %address.short(), "Trusted actor removed");
        }
        removed
    }

    /// Zero removes the peer, a positive weight adds or updates it
    pub fn set_trust(&self, address: Address, trust: TrustWeight) -> MembershipChange {
        let mut actors = self.actors.write();
        match (actors.get_mut(&address), trust.is_zero()) {
            (Some(_), true) => {
                actors.remove(&address);
                info!(address = %address.short(), "Trust revoked");
                MembershipChange::Removed
            }
            (Some(actor), false) => {
                actor.set_trust(trust);
                debug!(address = %address.short(), %trust, "Trust updated");
                MembershipChange::Updated
            }
            (None, false) => {
                actors.insert(address, TrustedEconomicActor::new(address, trust));
                info!(address = %address.short(), %trust, "Trust granted");
                MembershipChange::Added
            }
            (None, true) => MembershipChange::Unchanged,
        }
    }

    /// Trust of an address; unknown addresses are neutral (zero)
    pub fn trust_of(&self, address: &Address) -> TrustWeight {
        self.actors
            .read()
            .get(address)
            .map(|actor| actor.trust())
            .unwrap_or(TrustWeight::ZERO)
    }

    pub fn trusted_actors(&self) -> Vec<TrustedEconomicActor> {
        let mut actors: Vec<_> = self.actors.read().values().cloned().collect();
        actors.sort_by_key(|actor| actor.address());
        actors
    }

    pub fn len(&self) -> usize {
        self.actors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Feed a ledger transaction; returns whether it updated a trusted peer.
    ///
    /// Non-markers and markers from untrusted issuers are ignored. A marker
    /// with a forged signature is an error.
    pub fn ingest(&self, transaction: &Transaction) -> Result<bool> {
        if self.trust_of(&transaction.address).is_zero() {
            return Ok(false);
        }
        let marker = match Marker::decode(transaction) {
            Ok(marker) => marker,
            Err(ecluster_common::MarkerError::NotAMarker) => return Ok(false),
            Err(err) => return Err(err.into()),
        };

        let mut actors = self.actors.write();
        let Some(actor) = actors.get_mut(&marker.issuer) else {
            return Ok(false);
        };
        let recorded = actor.observe(marker.tangle, marker.confidence, marker.index);
        if recorded {
            debug!(
                issuer = %marker.issuer.short(),
                tangle = ?marker.tangle,
                confidence = marker.confidence,
                "Marker recorded"
            );
        }
        Ok(recorded)
    }

    /// Union of tangles marked by any trusted peer
    pub fn get_all_tangles(&self) -> BTreeSet<Tangle> {
        self.actors
            .read()
            .values()
            .flat_map(|actor| actor.marked_tangles())
            .collect()
    }

    /// Trust-weighted confidence among peers with an opinion on `transaction`
    pub fn determine_approval_confidence(&self, transaction: &TransactionRef) -> f64 {
        let opinions = self.opinions(transaction);
        if opinions.opinionated_weight == 0.0 {
            return 0.0;
        }
        (opinions.weighted_confidence / opinions.opinionated_weight).clamp(0.0, 1.0)
    }

    /// Fraction of total trust weight with an opinion on `transaction`
    pub fn determine_turnout(&self, transaction: &TransactionRef) -> f64 {
        let opinions = self.opinions(transaction);
        if opinions.total_weight == 0.0 {
            return 0.0;
        }
        (opinions.opinionated_weight / opinions.total_weight).clamp(0.0, 1.0)
    }

    /// Approval scaled by turnout; what settlement compares against its threshold
    pub fn determine_confidence(&self, transaction: &TransactionRef) -> f64 {
        let opinions = self.opinions(transaction);
        if opinions.total_weight == 0.0 {
            return 0.0;
        }
        (opinions.weighted_confidence / opinions.total_weight).clamp(0.0, 1.0)
    }

    /// One peer's confidence in `transaction`, if it is trusted and has an opinion
    pub fn confidence_by_actor(&self, transaction: &TransactionRef, address: &Address) -> Option<f64> {
        let actors = self.actors.read();
        let actor = actors.get(address)?;
        self.actor_opinion(actor, transaction)
    }

    /// Marked tangles of one peer with their last seen confidence
    pub fn markers_of(&self, address: &Address) -> Option<Vec<(Tangle, f64)>> {
        let actors = self.actors.read();
        let actor = actors.get(address)?;
        let mut markers: Vec<_> = actor.markers().map(|(t, c)| (*t, c)).collect();
        markers.sort_by(|a, b| a.0.cmp(&b.0));
        Some(markers)
    }

    /// Whether `tangle` approves `transaction`
    pub fn references(&self, tangle: &Tangle, transaction: &TransactionRef) -> bool {
        tangle.references().iter().any(|tip| {
            tip == transaction || self.cones.cone(self.ledger.as_ref(), tip).contains(transaction)
        })
    }

    fn actor_opinion(&self, actor: &TrustedEconomicActor, transaction: &TransactionRef) -> Option<f64> {
        actor
            .markers()
            .filter(|(tangle, _)| self.references(tangle, transaction))
            .map(|(_, confidence)| confidence)
            .fold(None, |best: Option<f64>, c| Some(best.map_or(c, |b| b.max(c))))
    }

    fn opinions(&self, transaction: &TransactionRef) -> Opinions {
        let actors = self.actors.read();
        let mut opinions = Opinions::default();
        for actor in actors.values() {
            let weight = actor.trust().value();
            opinions.total_weight += weight;
            if let Some(confidence) = self.actor_opinion(actor, transaction) {
                opinions.opinionated_weight += weight;
                opinions.weighted_confidence += weight * confidence;
            }
        }
        opinions
    }
}
