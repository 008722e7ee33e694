//! Ledger Validator
//!
//! Decides whether tips can coexist:
//! 1. Traces the past cone of every given reference
//! 2. Merges the cones, counting each transaction once
//! 3. Adds the net value per address to the initial balances
//! 4. Rejects as soon as any address ends below zero
//!
//! A tangle that fails its own check is a double spend and is never scored.

use crate::ledger::{ConeCache, HostLedger};
use ecluster_common::{Address, LedgerError, Tangle, TransactionRef};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Balance-tracing validator over the host ledger
pub struct LedgerValidator {
    ledger: Arc<dyn HostLedger>,
    /// Balances held before the recorded history
    initial_balances: HashMap<Address, Decimal>,
    cones: ConeCache,
}

impl LedgerValidator {
    pub fn new(ledger: Arc<dyn HostLedger>, initial_balances: HashMap<Address, Decimal>) -> Self {
        Self {
            ledger,
            initial_balances,
            cones: ConeCache::new(),
        }
    }

    /// Add `delta` to the baseline of `address`
    pub fn change_initial_balance(&mut self, address: Address, delta: Decimal) {
        *self.initial_balances.entry(address).or_insert(Decimal::ZERO) += delta;
    }

    pub fn initial_balance(&self, address: &Address) -> Decimal {
        self.initial_balances
            .get(address)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Whether a single tangle's two references are mutually consistent
    pub fn is_tangle_consistent(&self, tangle: &Tangle) -> Result<bool, LedgerError> {
        self.are_references_compatible(&tangle.references())
    }

    /// Whether two tangles can both be accepted
    pub fn are_tangles_compatible(&self, a: &Tangle, b: &Tangle) -> Result<bool, LedgerError> {
        self.are_references_compatible(&[a.ref1(), a.ref2(), b.ref1(), b.ref2()])
    }

    /// Whether accepting every reference keeps all balances non-negative.
    ///
    /// Cones are merged one reference at a time and the running balances of
    /// the addresses each cone touched are checked right away, so the trace
    /// stops at the first negative balance.
    ///
    /// Fails with [`LedgerError::MissingTransaction`] when a cone reaches a
    /// transaction the ledger does not (yet) know.
    #[instrument(level = "trace", skip(self, references))]
    pub fn are_references_compatible(
        &self,
        references: &[TransactionRef],
    ) -> Result<bool, LedgerError> {
        let mut counted = HashSet::new();
        let mut changes = HashMap::new();

        for reference in references {
            let touched = self.fold_cone(reference, &mut counted, &mut changes)?;
            for address in touched {
                let balance = self.initial_balance(&address) + changes[&address];
                if balance < Decimal::ZERO {
                    debug!(address = %address.short(), %balance, "Negative balance, references incompatible");
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Net value moved per address across the merged cones
    pub fn balance_changes(
        &self,
        references: &[TransactionRef],
    ) -> Result<HashMap<Address, Decimal>, LedgerError> {
        let mut counted = HashSet::new();
        let mut changes = HashMap::new();
        for reference in references {
            self.fold_cone(reference, &mut counted, &mut changes)?;
        }
        Ok(changes)
    }

    /// Add the not yet counted transfers of one cone; returns the addresses it moved
    fn fold_cone(
        &self,
        reference: &TransactionRef,
        counted: &mut HashSet<TransactionRef>,
        changes: &mut HashMap<Address, Decimal>,
    ) -> Result<HashSet<Address>, LedgerError> {
        let cone = self.cones.cone(self.ledger.as_ref(), reference);
        if let Some(missing) = cone.missing().first() {
            return Err(LedgerError::MissingTransaction(missing.to_hex()));
        }
        let mut touched = HashSet::new();
        for (hash, (address, value)) in cone.transfers() {
            if counted.insert(*hash) {
                *changes.entry(*address).or_insert(Decimal::ZERO) += value;
                touched.insert(*address);
            }
        }
        Ok(touched)
    }
}
