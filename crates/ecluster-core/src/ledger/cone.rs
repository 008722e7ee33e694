//! Past cone tracing
//!
//! The past cone of a tip is every transaction reachable backwards through
//! trunk and branch, the tip included, stopping at the NULL transaction.
//! A cone that reached no unknown transaction is complete; complete cones
//! never change and are cached per tip.

use super::HostLedger;
use ecluster_common::{Address, TransactionRef};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PastCone {
    members: HashSet<TransactionRef>,
    /// Value-moving members: hash -> (address, value)
    transfers: HashMap<TransactionRef, (Address, Decimal)>,
    /// Referenced transactions the ledger does not know
    missing: Vec<TransactionRef>,
}

impl PastCone {
    /// Walk the DAG backwards from `tip`
    pub fn trace(ledger: &dyn HostLedger, tip: &TransactionRef) -> Self {
        let mut cone = PastCone::default();
        let mut visited = HashSet::new();
        let mut stack = vec![*tip];

        while let Some(hash) = stack.pop() {
            if hash.is_null() || !visited.insert(hash) {
                continue;
            }
            match ledger.find_transaction_by_hash(&hash) {
                Some(transaction) => {
                    if transaction.is_value_transaction() {
                        cone.transfers
                            .insert(hash, (transaction.address, transaction.value));
                    }
                    cone.members.insert(hash);
                    stack.extend(transaction.parents());
                }
                None => cone.missing.push(hash),
            }
        }

        cone
    }

    /// Whether `transaction` is approved by the tip (inclusive). Genesis is in every cone.
    pub fn contains(&self, transaction: &TransactionRef) -> bool {
        transaction.is_null() || self.members.contains(transaction)
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn missing(&self) -> &[TransactionRef] {
        &self.missing
    }

    pub fn transfers(&self) -> impl Iterator<Item = (&TransactionRef, &(Address, Decimal))> {
        self.transfers.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Cache of complete cones keyed by tip
#[derive(Default)]
pub struct ConeCache {
    cones: RwLock<HashMap<TransactionRef, Arc<PastCone>>>,
}

impl ConeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached cone, or a fresh trace (cached only when complete)
    pub fn cone(&self, ledger: &dyn HostLedger, tip: &TransactionRef) -> Arc<PastCone> {
        if let Some(cone) = self.cones.read().get(tip) {
            return cone.clone();
        }
        let cone = Arc::new(PastCone::trace(ledger, tip));
        if cone.is_complete() {
            self.cones.write().insert(*tip, cone.clone());
        }
        cone
    }

    pub fn len(&self) -> usize {
        self.cones.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use ecluster_common::TransactionBuilder;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trace_follows_trunk_and_branch() {
        let ledger = InMemoryLedger::new();
        let a = TransactionBuilder::new().timestamp(1).build();
        let b = TransactionBuilder::new()
            .value(dec!(5))
            .address(Address::new([1u8; 32]))
            .timestamp(2)
            .build();
        let c = TransactionBuilder::new()
            .trunk(a.hash)
            .branch(b.hash)
            .timestamp(3)
            .build();
        ledger.insert(a.clone());
        ledger.insert(b.clone());
        ledger.insert(c.clone());

        let cone = PastCone::trace(&ledger, &c.hash);
        assert!(cone.is_complete());
        assert_eq!(cone.len(), 3);
        assert!(cone.contains(&a.hash));
        assert!(cone.contains(&TransactionRef::NULL));
        assert_eq!(cone.transfers().count(), 1);

        let partial = PastCone::trace(&ledger, &a.hash);
        assert!(!partial.contains(&b.hash));
    }

    #[test]
    fn test_missing_parent_makes_cone_incomplete() {
        let ledger = InMemoryLedger::new();
        let ghost = TransactionRef::digest(b"ghost");
        let tip = TransactionBuilder::new().trunk(ghost).build();
        ledger.insert(tip.clone());

        let cache = ConeCache::new();
        let cone = cache.cone(&ledger, &tip.hash);
        assert!(!cone.is_complete());
        assert_eq!(cone.missing(), &[ghost]);
        assert!(cache.is_empty());

        let null_cone = cache.cone(&ledger, &TransactionRef::NULL);
        assert!(null_cone.is_complete());
        assert!(null_cone.is_empty());
        assert_eq!(cache.len(), 1);
    }
}
