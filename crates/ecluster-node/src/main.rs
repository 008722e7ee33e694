//! EC Node Binary
//!
//! Periodically ticks every owned actor and feeds gossiped markers into the cluster.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecluster_core::InMemoryLedger;
use ecluster_node::{EcNode, NodeConfig, TrustStore, NODE_VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting EC node v{}", NODE_VERSION);

    let config = NodeConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let (gossip_tx, mut gossip_rx) = mpsc::unbounded_channel();
    let ledger = Arc::new(InMemoryLedger::new().with_gossip(gossip_tx));
    let node = Arc::new(EcNode::new(config.clone(), ledger));

    let store = TrustStore::new(config.persistence_path.clone());
    store.load(&node)?;

    let actor = node.bootstrap().await?;
    info!(%actor, "Bootstrap actor ready");

    // Gossip -> cluster
    let gossip_node = node.clone();
    let gossip = tokio::spawn(async move {
        while let Some(transaction) = gossip_rx.recv().await {
            if let Err(err) = gossip_node.ingest(&transaction) {
                warn!(hash = %transaction.hash.short(), error = %err, "Rejected marker");
            }
        }
    });

    let mut ticker = tokio::time::interval(config.tick_interval);
    info!(interval_ms = config.tick_interval.as_millis() as u64, "Tick scheduler running");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for (address, result) in node.tick_all(&[]).await {
                    match result {
                        Ok(report) => info!(
                            actor = %address.short(),
                            published = report.published.len(),
                            invalid = report.invalid.len(),
                            unsolid = report.unsolid.len(),
                            "Actor ticked"
                        ),
                        Err(err) => error!(actor = %address.short(), error = %err, "Actor tick failed"),
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    error!(error = %err, "Failed to listen for shutdown signal");
                }
                info!("Received shutdown signal");
                break;
            }
        }
    }

    gossip.abort();
    store.store(&node)?;
    info!("Shutting down EC node");
    Ok(())
}
