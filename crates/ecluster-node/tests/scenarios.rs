//! End-to-end node scenarios over the in-memory ledger

use std::sync::Arc;

use ecluster_common::crypto::{derive_address, MerkleSigningKey, Seed};
use ecluster_common::{Address, CryptoError, EcError, Tangle, TransactionRef};
use ecluster_core::{HostLedger, InMemoryLedger, Marker};
use ecluster_node::{EcNode, NodeConfig};
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

fn node_on(ledger: Arc<InMemoryLedger>) -> EcNode {
    EcNode::new(NodeConfig::default(), ledger)
}

fn peer(seed: u8) -> MerkleSigningKey {
    MerkleSigningKey::new(Seed::new([seed; 32]), 4, 0).unwrap()
}

#[tokio::test]
async fn test_balance_follows_confirmation() {
    let ledger = Arc::new(InMemoryLedger::new());
    let node = node_on(ledger.clone());
    let seed = Seed::new([11u8; 32]);
    let x = derive_address(&seed, 0);
    node.change_initial_balance(x, dec!(100)).await;

    let head = node
        .send_transfer(&seed, 0, Address::new([1u8; 32]), x, dec!(40), true)
        .await
        .unwrap();

    // Unconfirmed: nothing settles
    assert_eq!(node.get_balance_of_address(&x), dec!(100));

    let mut witness = peer(1);
    node.set_trust(witness.address(), 1.0).unwrap();
    let marker = Marker::build(&mut witness, Tangle::new(head, TransactionRef::NULL), 1.0).unwrap();
    assert!(node.ingest(&marker).unwrap());

    assert_eq!(node.get_confidence(&head), 1.0);
    assert_eq!(node.get_balance_of_address(&x), dec!(60));
}

#[tokio::test]
async fn test_weak_approval_does_not_settle() {
    let ledger = Arc::new(InMemoryLedger::new());
    let node = node_on(ledger.clone());
    let seed = Seed::new([12u8; 32]);
    let x = derive_address(&seed, 0);
    node.change_initial_balance(x, dec!(100)).await;
    let head = node
        .send_transfer(&seed, 0, Address::new([1u8; 32]), x, dec!(40), true)
        .await
        .unwrap();

    let mut witness = peer(2);
    node.set_trust(witness.address(), 1.0).unwrap();
    let marker = Marker::build(&mut witness, Tangle::new(head, TransactionRef::NULL), 0.95).unwrap();
    node.ingest(&marker).unwrap();

    assert_eq!(node.get_confidence_by_actor(&head, &witness.address()), Some(0.95));
    assert_eq!(node.get_balance_of_address(&x), dec!(100));
}

#[tokio::test]
async fn test_minority_vote_does_not_settle() {
    let ledger = Arc::new(InMemoryLedger::new());
    let node = node_on(ledger.clone());
    let seed = Seed::new([18u8; 32]);
    let x = derive_address(&seed, 0);
    node.change_initial_balance(x, dec!(100)).await;
    let head = node
        .send_transfer(&seed, 0, Address::new([1u8; 32]), x, dec!(40), true)
        .await
        .unwrap();

    for silent in 20..23 {
        node.set_trust(peer(silent).address(), 1.0).unwrap();
    }
    let mut minor = peer(23);
    node.set_trust(minor.address(), 0.01).unwrap();
    let marker = Marker::build(&mut minor, Tangle::new(head, TransactionRef::NULL), 1.0).unwrap();
    assert!(node.ingest(&marker).unwrap());

    assert_eq!(node.cluster().determine_approval_confidence(&head), 1.0);
    assert!(node.get_confidence(&head) < 0.01);
    assert_eq!(node.get_balance_of_address(&x), dec!(100));
}

#[tokio::test]
async fn test_double_spend_tangles_conflict() {
    let ledger = Arc::new(InMemoryLedger::new());
    let node = node_on(ledger.clone());
    let seed = Seed::new([13u8; 32]);
    let x = derive_address(&seed, 0);
    node.change_initial_balance(x, dec!(100)).await;
    let actor = node
        .create_actor(Seed::new([14u8; 32]), 4, 0)
        .await
        .unwrap();

    let first = node
        .send_transfer(&seed, 0, Address::new([1u8; 32]), x, dec!(60), true)
        .await
        .unwrap();
    let second = node
        .send_transfer(&seed, 0, Address::new([2u8; 32]), x, dec!(60), true)
        .await
        .unwrap();

    let a = Tangle::new(TransactionRef::NULL, first);
    let b = Tangle::new(TransactionRef::NULL, second);
    let results = node.tick_all(&[a.id(), b.id()]).await;
    assert_eq!(results.len(), 1);
    let (address, report) = &results[0];
    assert_eq!(*address, actor);

    let report = report.as_ref().unwrap();
    assert!(report.invalid.is_empty());
    assert!(report.confidences[&a] < 0.5);
    assert!(report.confidences[&b] < 0.5);
}

#[tokio::test]
async fn test_revoked_trust_drops_peer_tangles() {
    let ledger = Arc::new(InMemoryLedger::new());
    let node = node_on(ledger);
    let mut peer_key = peer(3);
    let tangle = Tangle::new(TransactionRef::NULL, TransactionRef::NULL);

    node.set_trust(peer_key.address(), 0.5).unwrap();
    node.ingest(&Marker::build(&mut peer_key, tangle, 0.7).unwrap())
        .unwrap();
    assert!(node.cluster().get_all_tangles().contains(&tangle));
    assert_eq!(node.get_markers(&peer_key.address()).unwrap(), vec![(tangle, 0.7)]);

    node.set_trust(peer_key.address(), 0.0).unwrap();
    assert!(node.cluster().get_all_tangles().is_empty());
    assert!(node.trusted_actors().is_empty());
}

#[tokio::test]
async fn test_markers_travel_over_gossip() {
    let (gossip_tx, mut gossip_rx) = mpsc::unbounded_channel();
    let ledger = Arc::new(InMemoryLedger::new().with_gossip(gossip_tx));
    let publisher = node_on(ledger.clone());
    let follower = node_on(ledger.clone());

    let actor = publisher
        .create_actor(Seed::new([15u8; 32]), 3, 0)
        .await
        .unwrap();
    follower.set_trust(actor, 1.0).unwrap();

    let marker = publisher
        .consider_tangle(&actor, TransactionRef::NULL, TransactionRef::NULL)
        .await
        .unwrap()
        .unwrap();
    let gossiped = gossip_rx.recv().await.unwrap();
    assert_eq!(gossiped.hash, marker.hash);
    assert!(ledger.find_transaction_by_hash(&marker.hash).is_some());

    assert!(follower.ingest(&gossiped).unwrap());
    let tangle = Tangle::new(TransactionRef::NULL, TransactionRef::NULL);
    assert_eq!(follower.get_markers(&actor).unwrap(), vec![(tangle, 0.05)]);
}

#[tokio::test]
async fn test_exhausted_actor_reports_error() {
    let ledger = Arc::new(InMemoryLedger::new());
    let node = node_on(ledger);
    let actor = node.create_actor(Seed::new([16u8; 32]), 0, 0).await.unwrap();
    node.consider_tangle(&actor, TransactionRef::NULL, TransactionRef::NULL)
        .await
        .unwrap();

    let genesis = Tangle::new(TransactionRef::NULL, TransactionRef::NULL);
    let results = node.tick_all(&[genesis.id()]).await;
    assert!(matches!(
        results[0].1,
        Err(EcError::Crypto(CryptoError::KeyExhausted { capacity: 1 }))
    ));
}

#[tokio::test]
async fn test_delete_actor() {
    let node = node_on(Arc::new(InMemoryLedger::new()));
    let actor = node.create_actor(Seed::new([17u8; 32]), 2, 0).await.unwrap();
    assert_eq!(node.actor_addresses().await, vec![actor]);
    node.delete_actor(&actor).await.unwrap();
    assert!(node.actor_addresses().await.is_empty());
    assert!(matches!(
        node.delete_actor(&actor).await,
        Err(EcError::UnknownActor(_))
    ));
}
