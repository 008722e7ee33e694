//! Error types for the economic clustering engine
//!
//! Provides a unified error type and domain-specific error variants

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using EcError
pub type Result<T> = std::result::Result<T, EcError>;

/// Unified error type for clustering operations
#[derive(Debug, Error)]
pub enum EcError {
    // Malformed caller input
    #[error("Malformed input: {0}")]
    Malformed(#[from] MalformedInput),

    // Crypto errors
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    // Host ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    // Marker decoding errors
    #[error("Marker error: {0}")]
    Marker(#[from] MarkerError),

    #[error("No actor with address {0}")]
    UnknownActor(String),

    #[error("Insufficient balance (balance={balance} < value={value})")]
    InsufficientFunds { balance: Decimal, value: Decimal },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Input rejected at the point of use
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedInput {
    #[error("{what} must be {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Trust weight must lie in [0, 1], got {0}")]
    TrustOutOfRange(f64),
}

/// Signing and key material errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CryptoError {
    #[error("Signing key exhausted: all {capacity} one-time indices used")]
    KeyExhausted { capacity: u64 },

    #[error("Merkle depth {0} unsupported (max {max})", max = crate::crypto::merkle::MAX_DEPTH)]
    UnsupportedDepth(u32),

    #[error("Start index {index} beyond key capacity {capacity}")]
    StartIndexOutOfRange { index: u64, capacity: u64 },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Merkle proof verification failed")]
    MerkleProofInvalid,
}

/// Host ledger interaction errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Transaction not found in ledger: {0}")]
    MissingTransaction(String),
}

/// Marker decoding errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarkerError {
    #[error("Transaction is not a marker")]
    NotAMarker,

    #[error("Marker payload invalid: {0}")]
    InvalidPayload(String),

    #[error("Marker signature does not match address {address}")]
    SignatureMismatch { address: String },
}

// Implement From for common external error types
impl From<serde_json::Error> for EcError {
    fn from(err: serde_json::Error) -> Self {
        EcError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for EcError {
    fn from(err: bincode::Error) -> Self {
        EcError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for EcError {
    fn from(err: std::io::Error) -> Self {
        EcError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EcError::Malformed(MalformedInput::InvalidLength {
            what: "tangle",
            expected: 64,
            actual: 12,
        });
        assert!(err.to_string().contains("64 bytes, got 12"));
    }

    #[test]
    fn test_exhaustion_is_surfaced() {
        let err: EcError = CryptoError::KeyExhausted { capacity: 8 }.into();
        assert!(matches!(err, EcError::Crypto(CryptoError::KeyExhausted { capacity: 8 })));
        assert!(err.to_string().contains("all 8 one-time indices"));
    }

    #[test]
    fn test_external_errors_fold_into_domain_variants() {
        let err: EcError = LedgerError::MissingTransaction("ab12".into()).into();
        assert!(matches!(err, EcError::Ledger(LedgerError::MissingTransaction(_))));

        let err: EcError = std::io::Error::new(std::io::ErrorKind::NotFound, "trust.json").into();
        assert!(matches!(err, EcError::Storage(ref msg) if msg.contains("trust.json")));

        let err: EcError = serde_json::from_str::<u8>("nope").unwrap_err().into();
        assert!(matches!(err, EcError::Serialization(_)));
    }

    #[test]
    fn test_insufficient_funds() {
        let err = EcError::InsufficientFunds {
            balance: Decimal::from(10),
            value: Decimal::from(40),
        };
        assert!(err.to_string().contains("balance=10 < value=40"));
    }
}
