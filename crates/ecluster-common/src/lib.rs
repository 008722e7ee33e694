//! # EC Common
//!
//! Shared types, errors, and signing key material for the economic
//! clustering engine.
//!
//! ## Core Types
//!
//! - [`TransactionRef`]/[`Address`]: 32-byte ledger hashes
//! - [`Tangle`]: a candidate pair of tip references
//! - [`Transaction`]: the host ledger's transaction record
//! - [`TrustWeight`]: per-peer weight in `[0, 1]`
//!
//! ## Crypto
//!
//! - [`crypto::keys`]: deterministic ed25519 key derivation from a seed
//! - [`crypto::merkle`]: merkle-indexed one-time signing key for markers

pub mod crypto;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{CryptoError, EcError, LedgerError, MalformedInput, MarkerError, Result};
pub use types::{
    confidence::{decode_confidence, encode_confidence, is_marker_tag, quantize_confidence},
    hash::{Address, TransactionRef, HASH_LENGTH},
    tangle::{Tangle, TANGLE_ID_LENGTH},
    transaction::{Tag, Transaction, TransactionBuilder, NULL_TAG, TAG_LENGTH},
    trust::TrustWeight,
};

/// Default incumbent boost applied to the most confident tangle
pub const DEFAULT_AGGRESSIVITY: f64 = 1.1;

/// Default damping divisor for published confidence changes
pub const DEFAULT_CONSERVATIVITY: f64 = 20.0;

/// Cluster confidence above which a value transaction counts as settled
pub const DEFAULT_CONFIRMATION_CONFIDENCE: f64 = 0.95;

/// Confidence attached to the first marker of a freshly considered tangle
pub const INITIAL_MARKER_CONFIDENCE: f64 = 0.05;
