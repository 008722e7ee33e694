//! Deterministic key derivation
//!
//! Keys are derived from a 32-byte seed and an index. Marker keys and
//! transfer keys live in separate BLAKE3 derivation contexts, so the same
//! seed and index never yield the same key for both purposes.

use crate::error::MalformedInput;
use crate::types::hash::Address;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::RngCore;

/// Seed size in bytes
pub const SEED_LENGTH: usize = 32;

const MARKER_CONTEXT: &str = "ecluster 2024-01-01 marker signing key";
const TRANSFER_CONTEXT: &str = "ecluster 2024-01-01 transfer signing key";

/// What a derived key is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPurpose {
    /// Leaves of an actor's merkle signing key
    Marker,
    /// Value-holding addresses
    Transfer,
}

impl KeyPurpose {
    fn context(&self) -> &'static str {
        match self {
            KeyPurpose::Marker => MARKER_CONTEXT,
            KeyPurpose::Transfer => TRANSFER_CONTEXT,
        }
    }
}

/// Secret seed all keys of one identity are derived from
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; SEED_LENGTH]);

impl Seed {
    pub fn new(bytes: [u8; SEED_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Fresh random seed
    pub fn random() -> Self {
        let mut bytes = [0u8; SEED_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_hex(text: &str) -> Result<Self, MalformedInput> {
        let bytes = hex::decode(text).map_err(|e| MalformedInput::InvalidHex(e.to_string()))?;
        let array: [u8; SEED_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| MalformedInput::InvalidLength {
                    what: "seed",
                    expected: SEED_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// Derive the signing key at `index` for the given purpose
pub fn derive_signing_key(seed: &Seed, index: u64, purpose: KeyPurpose) -> SigningKey {
    let mut material = [0u8; SEED_LENGTH + 8];
    material[..SEED_LENGTH].copy_from_slice(seed.as_bytes());
    material[SEED_LENGTH..].copy_from_slice(&index.to_le_bytes());
    SigningKey::from_bytes(&blake3::derive_key(purpose.context(), &material))
}

/// Address controlled by a verifying key
pub fn address_of(verifying_key: &VerifyingKey) -> Address {
    Address::new(*blake3::hash(verifying_key.as_bytes()).as_bytes())
}

/// Address of the transfer key at `index`
pub fn derive_address(seed: &Seed, index: u64) -> Address {
    address_of(&derive_signing_key(seed, index, KeyPurpose::Transfer).verifying_key())
}

/// Addresses of the first `amount` transfer keys
pub fn derive_addresses(seed: &Seed, amount: u64) -> Vec<Address> {
    (0..amount).map(|index| derive_address(seed, index)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let seed = Seed::new([7u8; SEED_LENGTH]);
        assert_eq!(derive_address(&seed, 3), derive_address(&seed, 3));
        assert_ne!(derive_address(&seed, 3), derive_address(&seed, 4));
    }

    #[test]
    fn test_purposes_are_separated() {
        let seed = Seed::new([7u8; SEED_LENGTH]);
        let marker = derive_signing_key(&seed, 0, KeyPurpose::Marker);
        let transfer = derive_signing_key(&seed, 0, KeyPurpose::Transfer);
        assert_ne!(marker.to_bytes(), transfer.to_bytes());
    }

    #[test]
    fn test_seed_hex() {
        let seed = Seed::from_hex(&"01".repeat(SEED_LENGTH)).unwrap();
        assert_eq!(seed.as_bytes(), &[1u8; SEED_LENGTH]);
        assert!(Seed::from_hex("0102").is_err());
        assert_eq!(format!("{:?}", seed), "Seed(..)");
        assert_eq!(derive_addresses(&seed, 4).len(), 4);
    }
}
