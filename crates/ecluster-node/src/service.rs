//! Node service
//!
//! Owns the autonomous actors, the shared cluster and the node-wide balance
//! baseline, and exposes the operations an operator or API layer calls.

use crate::config::NodeConfig;
use ecluster_common::crypto::{derive_signing_key, keys::address_of, KeyPurpose, MerkleSigningKey, Seed};
use ecluster_common::{
    Address, EcError, Result, Tangle, Transaction, TransactionBuilder, TransactionRef, TrustWeight,
};
use ecluster_core::{
    AutonomousEconomicActor, EconomicActor, EconomicCluster, HostLedger, MembershipChange,
    PublishedMarker, TickReport,
};
use ed25519_dalek::Signer;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

/// Economic clustering node
pub struct EcNode {
    config: NodeConfig,
    ledger: Arc<dyn HostLedger>,
    cluster: Arc<EconomicCluster>,
    actors: Mutex<BTreeMap<Address, AutonomousEconomicActor>>,
    initial_balances: RwLock<HashMap<Address, Decimal>>,
    /// Bundle heads of submitted transfers, starting with genesis
    transfers: RwLock<Vec<TransactionRef>>,
}

impl EcNode {
    pub fn new(config: NodeConfig, ledger: Arc<dyn HostLedger>) -> Self {
        Self {
            cluster: Arc::new(EconomicCluster::new(ledger.clone())),
            config,
            ledger,
            actors: Mutex::new(BTreeMap::new()),
            initial_balances: RwLock::new(HashMap::new()),
            transfers: RwLock::new(vec![TransactionRef::NULL]),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn cluster(&self) -> &Arc<EconomicCluster> {
        &self.cluster
    }

    pub fn ledger(&self) -> &Arc<dyn HostLedger> {
        &self.ledger
    }

    /// Create the first actor and let it announce the genesis tangle
    pub async fn bootstrap(&self) -> Result<Address> {
        let seed = match &self.config.actor_seed {
            Some(hex) => Seed::from_hex(hex)?,
            None => Seed::random(),
        };
        let address = self.create_actor(seed, self.config.merkle_depth, 0).await?;
        self.consider_tangle(&address, TransactionRef::NULL, TransactionRef::NULL)
            .await?;
        Ok(address)
    }

    /// Build a signing key and register a new autonomous actor
    pub async fn create_actor(&self, seed: Seed, merkle_depth: u32, start_index: u64) -> Result<Address> {
        let signing_key = MerkleSigningKey::new(seed, merkle_depth, start_index)?;
        let balances = self.initial_balances.read().clone();
        let actor = AutonomousEconomicActor::new(
            self.ledger.clone(),
            self.cluster.clone(),
            signing_key,
            balances,
            self.config.actor.clone(),
        );
        let address = actor.address();
        self.actors.lock().await.insert(address, actor);
        info!(%address, merkle_depth, "Actor created");
        Ok(address)
    }

    pub async fn delete_actor(&self, address: &Address) -> Result<()> {
        if self.actors.lock().await.remove(address).is_none() {
            return Err(EcError::UnknownActor(address.to_hex()));
        }
        info!(%address, "Actor deleted");
        Ok(())
    }

    pub async fn actor_addresses(&self) -> Vec<Address> {
        self.actors.lock().await.keys().copied().collect()
    }

    /// Validate `(ref1, ref2)` with the actor's view and publish an initial marker.
    ///
    /// Returns `None` when the tangle is a double spend.
    pub async fn consider_tangle(
        &self,
        actor: &Address,
        ref1: TransactionRef,
        ref2: TransactionRef,
    ) -> Result<Option<PublishedMarker>> {
        let mut actors = self.actors.lock().await;
        let actor = actors
            .get_mut(actor)
            .ok_or_else(|| EcError::UnknownActor(actor.to_hex()))?;
        let tangle = Tangle::new(ref1, ref2);
        let marker = actor.consider_tangle(tangle).await?;
        if marker.is_none() {
            warn!(tangle = %tangle.id(), "Considered tangle is invalid, not marked");
        }
        Ok(marker)
    }

    /// Trust weight in `[0, 1]`; zero stops following the address
    pub fn set_trust(&self, address: Address, trust: f64) -> Result<MembershipChange> {
        let trust = TrustWeight::new(trust)?;
        Ok(self.cluster.set_trust(address, trust))
    }

    pub fn trusted_actors(&self) -> Vec<(Address, TrustWeight)> {
        self.cluster
            .trusted_actors()
            .iter()
            .map(|actor| (actor.address(), actor.trust()))
            .collect()
    }

    /// Feed a gossiped transaction to the cluster
    pub fn ingest(&self, transaction: &Transaction) -> Result<bool> {
        self.cluster.ingest(transaction)
    }

    /// Turnout-weighted cluster confidence in `hash`
    pub fn get_confidence(&self, hash: &TransactionRef) -> f64 {
        self.cluster.determine_confidence(hash)
    }

    /// `None` when the address is not followed or has no opinion
    pub fn get_confidence_by_actor(&self, hash: &TransactionRef, actor: &Address) -> Option<f64> {
        self.cluster.confidence_by_actor(hash, actor)
    }

    pub fn get_markers(&self, actor: &Address) -> Result<Vec<(Tangle, f64)>> {
        self.cluster
            .markers_of(actor)
            .ok_or_else(|| EcError::UnknownActor(actor.to_hex()))
    }

    /// Initial balance plus every settled value transaction on `address`
    pub fn get_balance_of_address(&self, address: &Address) -> Decimal {
        let initial = self
            .initial_balances
            .read()
            .get(address)
            .copied()
            .unwrap_or(Decimal::ZERO);

        self.ledger
            .find_transactions_by_address(address)
            .iter()
            .filter(|tx| tx.is_value_transaction())
            .filter(|tx| {
                self.cluster.determine_confidence(&tx.hash) > self.config.confirmation_confidence
            })
            .fold(initial, |sum, tx| sum + tx.value)
    }

    /// Move `value` from the seed's `index` address to `receiver`.
    ///
    /// The whole spendable balance is consumed; anything left over goes to
    /// `remainder`. Returns the bundle head.
    #[instrument(skip(self, seed))]
    pub async fn send_transfer(
        &self,
        seed: &Seed,
        index: u64,
        receiver: Address,
        remainder: Address,
        value: Decimal,
        check_balances: bool,
    ) -> Result<TransactionRef> {
        let key = derive_signing_key(seed, index, KeyPurpose::Transfer);
        let sender = address_of(&key.verifying_key());
        let balance = self.get_balance_of_address(&sender);
        if check_balances && balance < value {
            return Err(EcError::InsufficientFunds { balance, value });
        }

        let spent = balance.max(value);
        let mut entries = vec![(sender, -spent), (receiver, value)];
        if spent > value {
            entries.push((remainder, spent - value));
        }

        let timestamp = chrono::Utc::now().timestamp_millis();
        let bundle = bundle_hash(&entries, timestamp);
        let signature = key.sign(bundle.as_bytes());
        let mut authorization = key.verifying_key().to_bytes().to_vec();
        authorization.extend_from_slice(&signature.to_bytes());

        let tip = TransactionRef::NULL;
        let mut next = tip;
        let mut bundle_txs = Vec::with_capacity(entries.len());
        for (position, (address, amount)) in entries.iter().enumerate().rev() {
            let payload = if position == 0 { authorization.clone() } else { Vec::new() };
            let transaction = TransactionBuilder::new()
                .trunk(next)
                .branch(tip)
                .address(*address)
                .value(*amount)
                .payload(payload)
                .bundle(bundle)
                .timestamp(timestamp)
                .build();
            next = transaction.hash;
            bundle_txs.push(transaction);
        }

        for transaction in bundle_txs {
            self.ledger.submit(transaction).await?;
        }
        self.transfers.write().push(next);
        info!(head = %next.short(), sender = %sender.short(), "Transfer submitted");
        Ok(next)
    }

    /// Adjust the balance baseline for the node and every owned actor
    pub async fn change_initial_balance(&self, address: Address, delta: Decimal) {
        *self
            .initial_balances
            .write()
            .entry(address)
            .or_insert(Decimal::ZERO) += delta;
        for actor in self.actors.lock().await.values_mut() {
            actor.change_initial_balance(address, delta);
        }
    }

    /// Tick every owned actor in turn. One actor's failure does not stop the others.
    pub async fn tick_all(&self, new_tangles: &[String]) -> Vec<(Address, Result<TickReport>)> {
        let mut actors = self.actors.lock().await;
        let mut results = Vec::with_capacity(actors.len());
        for (address, actor) in actors.iter_mut() {
            let result = actor.tick(new_tangles).await;
            if let Err(err) = &result {
                error!(%address, error = %err, "Tick failed");
            }
            results.push((*address, result));
        }
        results
    }

    pub fn transfers(&self) -> Vec<TransactionRef> {
        self.transfers.read().clone()
    }
}

fn bundle_hash(entries: &[(Address, Decimal)], timestamp: i64) -> TransactionRef {
    let mut essence = Vec::with_capacity(entries.len() * 48 + 8);
    for (address, amount) in entries {
        essence.extend_from_slice(address.as_bytes());
        essence.extend_from_slice(&amount.serialize());
    }
    essence.extend_from_slice(&timestamp.to_le_bytes());
    TransactionRef::digest(&essence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecluster_common::crypto::derive_address;
    use ecluster_core::InMemoryLedger;
    use rust_decimal_macros::dec;

    fn node() -> (Arc<InMemoryLedger>, EcNode) {
        let ledger = Arc::new(InMemoryLedger::new());
        let node = EcNode::new(NodeConfig::default(), ledger.clone());
        (ledger, node)
    }

    #[tokio::test]
    async fn test_unknown_actor_rejected() {
        let (_, node) = node();
        let ghost = Address::new([3u8; 32]);
        assert!(matches!(
            node.delete_actor(&ghost).await,
            Err(EcError::UnknownActor(_))
        ));
        assert!(matches!(
            node.consider_tangle(&ghost, TransactionRef::NULL, TransactionRef::NULL).await,
            Err(EcError::UnknownActor(_))
        ));
        assert!(matches!(node.get_markers(&ghost), Err(EcError::UnknownActor(_))));
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let (ledger, node) = node();
        let seed = Seed::new([5u8; 32]);
        let sender = derive_address(&seed, 0);
        node.change_initial_balance(sender, dec!(10)).await;

        let result = node
            .send_transfer(&seed, 0, Address::new([1u8; 32]), sender, dec!(11), true)
            .await;
        assert!(matches!(
            result,
            Err(EcError::InsufficientFunds { balance, value }) if balance == dec!(10) && value == dec!(11)
        ));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_transfer_bundle_shape() {
        let (ledger, node) = node();
        let seed = Seed::new([5u8; 32]);
        let sender = derive_address(&seed, 0);
        let receiver = Address::new([1u8; 32]);
        let remainder = Address::new([2u8; 32]);
        node.change_initial_balance(sender, dec!(100)).await;

        let head = node
            .send_transfer(&seed, 0, receiver, remainder, dec!(40), true)
            .await
            .unwrap();

        assert_eq!(ledger.len(), 3);
        let input = ledger.find_transaction_by_hash(&head).unwrap();
        assert_eq!(input.address, sender);
        assert_eq!(input.value, dec!(-100));
        assert_eq!(input.payload.len(), 96);
        assert_eq!(ledger.find_transactions_by_address(&receiver)[0].value, dec!(40));
        assert_eq!(ledger.find_transactions_by_address(&remainder)[0].value, dec!(60));
        assert_eq!(node.transfers(), vec![TransactionRef::NULL, head]);
    }

    #[tokio::test]
    async fn test_unchecked_transfer_without_funds() {
        let (ledger, node) = node();
        let seed = Seed::new([6u8; 32]);
        let head = node
            .send_transfer(&seed, 0, Address::new([1u8; 32]), Address::new([2u8; 32]), dec!(5), false)
            .await
            .unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.find_transaction_by_hash(&head).unwrap().value, dec!(-5));
    }

    #[test]
    fn test_set_trust_validates_range() {
        let (_, node) = node();
        assert!(matches!(
            node.set_trust(Address::new([1u8; 32]), 1.5),
            Err(EcError::Malformed(_))
        ));
        assert_eq!(
            node.set_trust(Address::new([1u8; 32]), 0.5).unwrap(),
            MembershipChange::Added
        );
        assert_eq!(node.trusted_actors().len(), 1);
    }
}
