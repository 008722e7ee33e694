//! Cryptographic facilities
//!
//! This module provides:
//! - Deterministic ed25519 key derivation from a seed
//! - Merkle-indexed one-time signing keys for marker publication

pub mod keys;
pub mod merkle;

// Re-export commonly used items
pub use keys::{derive_address, derive_signing_key, KeyPurpose, Seed};
pub use merkle::{MerkleSignature, MerkleSigningKey};
