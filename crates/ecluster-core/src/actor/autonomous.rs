//! Autonomous Economic Actor - the node's own voice in the cluster
//!
//! One tick runs four steps in order:
//! 1. Gather: tangles marked by trusted peers plus new candidates
//! 2. Validate: drop malformed, known-invalid and unsolid tangles
//! 3. Score: conflicts + seeds -> [`ConfidenceCalculator`]
//! 4. Publish: damped markers for tangles whose encoded confidence moved
//!
//! A tick takes `&mut self`, so ticks of one actor never overlap.

use super::{EconomicActor, Marker};
use crate::consensus::{ConfidenceCalculator, Conflict, EconomicCluster};
use crate::ledger::HostLedger;
use crate::validation::LedgerValidator;
use crate::ActorConfig;
use ecluster_common::crypto::MerkleSigningKey;
use ecluster_common::{
    encode_confidence, Address, EcError, LedgerError, MalformedInput, Result, Tangle,
    TransactionRef,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Marker submitted during a tick
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMarker {
    pub tangle: Tangle,
    /// Damped value that was signed
    pub confidence: f64,
    pub hash: TransactionRef,
}

/// Outcome of one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Candidates that failed to parse
    pub rejected: Vec<(String, MalformedInput)>,
    /// Tangles excluded as double spends
    pub invalid: Vec<Tangle>,
    /// Tangles whose history is not fully known yet
    pub unsolid: Vec<Tangle>,
    /// Calculator input per scored tangle
    pub seeds: BTreeMap<Tangle, f64>,
    /// Freshly calculated (undamped) confidences
    pub confidences: BTreeMap<Tangle, f64>,
    pub published: Vec<PublishedMarker>,
    pub most_confident: Option<Tangle>,
}

/// Locally controlled actor with its own signing key
pub struct AutonomousEconomicActor {
    config: ActorConfig,
    signing_key: MerkleSigningKey,
    ledger: Arc<dyn HostLedger>,
    cluster: Arc<EconomicCluster>,
    validator: LedgerValidator,
    /// Last published (damped) confidence per tangle
    published: HashMap<Tangle, f64>,
    most_confident: Option<(Tangle, f64)>,
    valid_tangles: HashSet<Tangle>,
    invalid_tangles: HashSet<Tangle>,
}

impl AutonomousEconomicActor {
    pub fn new(
        ledger: Arc<dyn HostLedger>,
        cluster: Arc<EconomicCluster>,
        signing_key: MerkleSigningKey,
        initial_balances: HashMap<Address, Decimal>,
        config: ActorConfig,
    ) -> Self {
        info!(
            address = %signing_key.address().short(),
            remaining = signing_key.remaining(),
            "Autonomous actor created"
        );
        Self {
            validator: LedgerValidator::new(ledger.clone(), initial_balances),
            config,
            signing_key,
            ledger,
            cluster,
            published: HashMap::new(),
            most_confident: None,
            valid_tangles: HashSet::new(),
            invalid_tangles: HashSet::new(),
        }
    }

    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    pub fn set_aggressivity(&mut self, aggressivity: f64) -> Result<()> {
        if !aggressivity.is_finite() || aggressivity < 0.0 {
            return Err(EcError::Config(format!(
                "aggressivity must be a non-negative number, got {aggressivity}"
            )));
        }
        self.config.aggressivity = aggressivity;
        Ok(())
    }

    pub fn set_conservativity(&mut self, conservativity: f64) -> Result<()> {
        if !conservativity.is_finite() || conservativity < 1.0 {
            return Err(EcError::Config(format!(
                "conservativity must be at least 1, got {conservativity}"
            )));
        }
        self.config.conservativity = conservativity;
        Ok(())
    }

    pub fn change_initial_balance(&mut self, address: Address, delta: Decimal) {
        self.validator.change_initial_balance(address, delta);
    }

    pub fn validator(&self) -> &LedgerValidator {
        &self.validator
    }

    /// Signatures left on the key
    pub fn remaining_signatures(&self) -> u64 {
        self.signing_key.remaining()
    }

    pub fn published_confidence(&self, tangle: &Tangle) -> Option<f64> {
        self.published.get(tangle).copied()
    }

    pub fn most_confident(&self) -> Option<(Tangle, f64)> {
        self.most_confident
    }

    /// Classify a tangle, consulting the caches first.
    ///
    /// Unsolid tangles return [`LedgerError::MissingTransaction`] and stay
    /// unclassified.
    pub fn is_tangle_valid(&mut self, tangle: &Tangle) -> Result<bool> {
        if self.invalid_tangles.contains(tangle) {
            return Ok(false);
        }
        if self.valid_tangles.contains(tangle) {
            return Ok(true);
        }
        let valid = self.validator.is_tangle_consistent(tangle)?;
        if valid {
            self.valid_tangles.insert(*tangle);
        } else {
            debug!(tangle = %tangle.id(), "Tangle classified invalid");
            self.invalid_tangles.insert(*tangle);
        }
        Ok(valid)
    }

    /// Validate a tangle and announce it with a low initial confidence
    pub async fn consider_tangle(&mut self, tangle: Tangle) -> Result<Option<PublishedMarker>> {
        if !self.is_tangle_valid(&tangle)? {
            return Ok(None);
        }
        let confidence = ecluster_common::INITIAL_MARKER_CONFIDENCE;
        let hash = self.publish_marker(tangle, confidence).await?;
        self.published.insert(tangle, confidence);
        Ok(Some(PublishedMarker {
            tangle,
            confidence,
            hash,
        }))
    }

    /// Run one re-evaluation cycle
    #[instrument(skip(self, new_tangles), fields(actor = %self.signing_key.address().short()))]
    pub async fn tick(&mut self, new_tangles: &[String]) -> Result<TickReport> {
        let mut report = TickReport::default();

        // Gather
        let mut candidates: BTreeSet<Tangle> = self.cluster.get_all_tangles();
        for id in new_tangles {
            match Tangle::parse(id) {
                Ok(tangle) => {
                    candidates.insert(tangle);
                }
                Err(err) => {
                    warn!(candidate = %id, error = %err, "Rejected malformed tangle");
                    report.rejected.push((id.clone(), err));
                }
            }
        }

        // Validate
        let mut tangles = Vec::with_capacity(candidates.len());
        for tangle in candidates {
            match self.is_tangle_valid(&tangle) {
                Ok(true) => tangles.push(tangle),
                Ok(false) => report.invalid.push(tangle),
                Err(EcError::Ledger(LedgerError::MissingTransaction(missing))) => {
                    debug!(tangle = %tangle.id(), %missing, "Tangle not solid yet");
                    report.unsolid.push(tangle);
                }
                Err(err) => return Err(err),
            }
        }
        if tangles.is_empty() {
            debug!("No valid tangles, nothing to publish");
            return Ok(report);
        }

        // Score
        let conflicts = self.find_all_conflicts(&tangles)?;
        let seeds: Vec<f64> = tangles
            .iter()
            .map(|tangle| self.guess_tangle_confidence(tangle, tangles.len()))
            .collect();
        let calculator = ConfidenceCalculator::new(&tangles, &conflicts, &seeds);
        report.seeds = tangles.iter().copied().zip(seeds.iter().copied()).collect();

        let mut best: Option<(Tangle, f64)> = None;
        for tangle in &tangles {
            let confidence = calculator.confidence_of(tangle);
            report.confidences.insert(*tangle, confidence);
            if best.map_or(true, |(_, c)| confidence > c) {
                best = Some((*tangle, confidence));
            }
        }
        self.most_confident = best;
        report.most_confident = best.map(|(tangle, _)| tangle);

        // Publish
        for tangle in &tangles {
            let fresh = calculator.confidence_of(tangle);
            if let Some(marker) = self.adjust_confidence(*tangle, fresh).await? {
                report.published.push(marker);
            }
        }

        info!(
            tangles = tangles.len(),
            conflicts = conflicts.len(),
            published = report.published.len(),
            iterations = calculator.iterations(),
            "Tick complete"
        );
        Ok(report)
    }

    /// Publish a damped marker if the quantized confidence changed
    pub async fn adjust_confidence(
        &mut self,
        tangle: Tangle,
        fresh: f64,
    ) -> Result<Option<PublishedMarker>> {
        let old = self.published.get(&tangle).copied();
        if let Some(old) = old {
            if encode_confidence(old) == encode_confidence(fresh) {
                return Ok(None);
            }
        }

        let base = old.unwrap_or(0.0);
        let damped = base + (fresh - base) / self.config.conservativity;
        let hash = self.publish_marker(tangle, damped).await?;
        self.published.insert(tangle, damped);
        Ok(Some(PublishedMarker {
            tangle,
            confidence: damped,
            hash,
        }))
    }

    /// Sign and submit a marker; fails when the key is exhausted
    pub async fn publish_marker(&mut self, tangle: Tangle, confidence: f64) -> Result<TransactionRef> {
        let transaction = Marker::build(&mut self.signing_key, tangle, confidence)?;
        let hash = transaction.hash;
        tokio::time::timeout(self.config.submit_timeout, self.ledger.submit(transaction))
            .await
            .map_err(|_| EcError::Timeout(format!("marker submission for {}", hash.short())))??;

        debug!(
            tangle = %tangle.id(),
            confidence,
            marker = %hash.short(),
            remaining = self.signing_key.remaining(),
            "Marker published"
        );
        if self.signing_key.is_exhausted() {
            warn!("Signing key exhausted, no further markers can be published");
        }
        Ok(hash)
    }

    /// Every pair of tangles that cannot both be accepted
    pub fn find_all_conflicts(&self, tangles: &[Tangle]) -> Result<HashSet<Conflict>> {
        let mut conflicts = HashSet::new();
        for (i, a) in tangles.iter().enumerate() {
            for b in &tangles[i + 1..] {
                if !self.validator.are_tangles_compatible(a, b)? {
                    conflicts.insert(Conflict::new(*a, *b));
                }
            }
        }
        Ok(conflicts)
    }

    /// Seed for one tangle: its weaker reference, boosted if incumbent
    pub fn guess_tangle_confidence(&self, tangle: &Tangle, candidates: usize) -> f64 {
        let guess = self
            .guess_transaction_confidence(&tangle.ref1(), candidates)
            .min(self.guess_transaction_confidence(&tangle.ref2(), candidates));
        match self.most_confident {
            Some((incumbent, _)) if incumbent == *tangle => guess * (1.0 + self.config.aggressivity),
            _ => guess,
        }
    }

    /// Cluster approval where peers voted, a uniform prior where they did not
    pub fn guess_transaction_confidence(&self, transaction: &TransactionRef, candidates: usize) -> f64 {
        let turnout = self.cluster.determine_turnout(transaction);
        let approval = self.cluster.determine_approval_confidence(transaction);
        turnout * approval + (1.0 - turnout) / candidates.max(1) as f64
    }
}

impl EconomicActor for AutonomousEconomicActor {
    fn address(&self) -> Address {
        self.signing_key.address()
    }

    fn marked_tangles(&self) -> Vec<Tangle> {
        self.published.keys().copied().collect()
    }

    fn tangle_confidence(&self, tangle: &Tangle) -> Option<f64> {
        self.published_confidence(tangle)
    }
}
