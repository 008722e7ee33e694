//! Host ledger boundary
//!
//! The clustering engine does not store or gossip transactions itself. It
//! reads the DAG and submits markers through [`HostLedger`], which the host
//! node provides. [`InMemoryLedger`] is a complete implementation for
//! single-process deployments and tests.

pub mod cone;
pub mod memory;

pub use cone::{ConeCache, PastCone};
pub use memory::InMemoryLedger;

use async_trait::async_trait;
use ecluster_common::{Address, Result, Transaction, TransactionRef};

/// Capabilities the host ledger must offer
#[async_trait]
pub trait HostLedger: Send + Sync {
    /// Look up one transaction
    fn find_transaction_by_hash(&self, hash: &TransactionRef) -> Option<Transaction>;

    /// All transactions moving value on (or issued by) an address
    fn find_transactions_by_address(&self, address: &Address) -> Vec<Transaction>;

    /// Inject a signed transaction into the ledger and gossip layer
    async fn submit(&self, transaction: Transaction) -> Result<()>;
}
