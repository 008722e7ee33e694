//! In-memory host ledger
//!
//! Append-only transaction store indexed by hash and address. Submitted
//! transactions are also forwarded to an optional gossip channel so the
//! node can feed them into the economic cluster.

use super::HostLedger;
use async_trait::async_trait;
use ecluster_common::{Address, Result, Transaction, TransactionRef};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Default)]
struct LedgerState {
    by_hash: HashMap<TransactionRef, Transaction>,
    by_address: HashMap<Address, Vec<TransactionRef>>,
    /// Insertion order
    order: Vec<TransactionRef>,
}

/// Append-only in-memory ledger
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    gossip: Option<mpsc::UnboundedSender<Transaction>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward every submitted transaction to `gossip`
    pub fn with_gossip(mut self, gossip: mpsc::UnboundedSender<Transaction>) -> Self {
        self.gossip = Some(gossip);
        self
    }

    /// Store a transaction without gossiping it. Returns false for duplicates.
    pub fn insert(&self, transaction: Transaction) -> bool {
        let mut state = self.state.write();
        if state.by_hash.contains_key(&transaction.hash) {
            return false;
        }
        state
            .by_address
            .entry(transaction.address)
            .or_default()
            .push(transaction.hash);
        state.order.push(transaction.hash);
        state.by_hash.insert(transaction.hash, transaction);
        true
    }

    pub fn len(&self) -> usize {
        self.state.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored transaction in insertion order
    pub fn transactions(&self) -> Vec<Transaction> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|hash| state.by_hash.get(hash).cloned())
            .collect()
    }
}

#[async_trait]
impl HostLedger for InMemoryLedger {
    fn find_transaction_by_hash(&self, hash: &TransactionRef) -> Option<Transaction> {
        self.state.read().by_hash.get(hash).cloned()
    }

    fn find_transactions_by_address(&self, address: &Address) -> Vec<Transaction> {
        let state = self.state.read();
        state
            .by_address
            .get(address)
            .map(|hashes| {
                hashes
                    .iter()
                    .filter_map(|hash| state.by_hash.get(hash).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn submit(&self, transaction: Transaction) -> Result<()> {
        if !self.insert(transaction.clone()) {
            debug!(hash = %transaction.hash.short(), "Duplicate transaction ignored");
            return Ok(());
        }
        if let Some(gossip) = &self.gossip {
            if gossip.send(transaction).is_err() {
                warn!("Gossip receiver dropped, transaction stored locally only");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecluster_common::TransactionBuilder;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_submit_indexes_and_gossips() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ledger = InMemoryLedger::new().with_gossip(tx);
        let address = Address::new([9u8; 32]);
        let transaction = TransactionBuilder::new()
            .address(address)
            .value(dec!(-10))
            .build();

        ledger.submit(transaction.clone()).await.unwrap();
        ledger.submit(transaction.clone()).await.unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.find_transaction_by_hash(&transaction.hash),
            Some(transaction.clone())
        );
        assert_eq!(ledger.find_transactions_by_address(&address).len(), 1);
        assert_eq!(rx.recv().await, Some(transaction));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unknown_lookups() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.is_empty());
        assert!(ledger
            .find_transaction_by_hash(&TransactionRef::digest(b"nope"))
            .is_none());
        assert!(ledger
            .find_transactions_by_address(&Address::NULL)
            .is_empty());
    }
}
