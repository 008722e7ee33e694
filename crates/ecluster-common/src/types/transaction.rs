//! Transaction - the host ledger's record
//!
//! Every transaction approves two earlier transactions (trunk and branch),
//! which makes the ledger a DAG. Value transactions move a signed amount on
//! one address; markers carry zero value and a confidence-encoding tag.

use super::hash::{Address, TransactionRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tag field width in bytes
pub const TAG_LENGTH: usize = 8;

/// Fixed-width tag field
pub type Tag = [u8; TAG_LENGTH];

/// Empty tag
pub const NULL_TAG: Tag = [0u8; TAG_LENGTH];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hash over every other field
    pub hash: TransactionRef,
    /// First approved transaction
    pub trunk: TransactionRef,
    /// Second approved transaction
    pub branch: TransactionRef,
    /// Address the value moves on (or the issuing actor for markers)
    pub address: Address,
    /// Negative for inputs, positive for outputs
    pub value: Decimal,
    pub tag: Tag,
    pub payload: Vec<u8>,
    /// Shared by all transactions of one bundle
    pub bundle: TransactionRef,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl Transaction {
    /// Compute the transaction hash from its contents
    pub fn compute_hash(&self) -> TransactionRef {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.trunk.as_bytes());
        hasher.update(self.branch.as_bytes());
        hasher.update(self.address.as_bytes());
        hasher.update(&self.value.serialize());
        hasher.update(&self.tag);
        hasher.update(&(self.payload.len() as u64).to_le_bytes());
        hasher.update(&self.payload);
        hasher.update(self.bundle.as_bytes());
        hasher.update(&self.timestamp.to_le_bytes());
        TransactionRef::new(*hasher.finalize().as_bytes())
    }

    pub fn is_value_transaction(&self) -> bool {
        !self.value.is_zero()
    }

    /// Both approved transactions, trunk first
    pub fn parents(&self) -> [TransactionRef; 2] {
        [self.trunk, self.branch]
    }
}

/// Builder for transactions; the hash is filled in by [`TransactionBuilder::build`]
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    trunk: TransactionRef,
    branch: TransactionRef,
    address: Address,
    value: Decimal,
    tag: Tag,
    payload: Vec<u8>,
    bundle: TransactionRef,
    timestamp: Option<i64>,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self {
            trunk: TransactionRef::NULL,
            branch: TransactionRef::NULL,
            address: Address::NULL,
            value: Decimal::ZERO,
            tag: NULL_TAG,
            payload: Vec::new(),
            bundle: TransactionRef::NULL,
            timestamp: None,
        }
    }

    pub fn trunk(mut self, trunk: TransactionRef) -> Self {
        self.trunk = trunk;
        self
    }

    pub fn branch(mut self, branch: TransactionRef) -> Self {
        self.branch = branch;
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn value(mut self, value: Decimal) -> Self {
        self.value = value;
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn bundle(mut self, bundle: TransactionRef) -> Self {
        self.bundle = bundle;
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> Transaction {
        let mut transaction = Transaction {
            hash: TransactionRef::NULL,
            trunk: self.trunk,
            branch: self.branch,
            address: self.address,
            value: self.value,
            tag: self.tag,
            payload: self.payload,
            bundle: self.bundle,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        };
        transaction.hash = transaction.compute_hash();
        transaction
    }
}
