//! Merkle-indexed one-time signing key
//!
//! An economic actor signs markers with a binary Merkle tree over `2^depth`
//! ed25519 verifying keys. The root is the actor's address. Each leaf key
//! signs at most once; when the last index is used the key is exhausted
//! and every further `sign` fails with [`CryptoError::KeyExhausted`].

use super::keys::{derive_signing_key, KeyPurpose, Seed};
use crate::error::CryptoError;
use crate::types::hash::{Address, HASH_LENGTH};
use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Deepest supported tree
pub const MAX_DEPTH: u32 = 20;

/// Signature by one leaf plus the path from that leaf to the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleSignature {
    /// Leaf index that signed
    pub index: u64,
    /// Leaf verifying key
    pub public_key: [u8; 32],
    /// ed25519 signature bytes (64)
    pub signature: Vec<u8>,
    /// Sibling hashes from leaf to root
    pub path: Vec<[u8; HASH_LENGTH]>,
}

impl MerkleSignature {
    /// Check the leaf signature over `message` and the path up to `address`
    pub fn verify(&self, message: &[u8], address: &Address) -> Result<(), CryptoError> {
        if self.path.len() as u32 > MAX_DEPTH || self.index >= 1u64 << self.path.len() {
            return Err(CryptoError::MerkleProofInvalid);
        }

        let verifying_key =
            VerifyingKey::from_bytes(&self.public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
        let signature =
            Signature::from_slice(&self.signature).map_err(|_| CryptoError::InvalidSignature)?;
        verifying_key
            .verify(message, &signature)
            .map_err(|_| CryptoError::InvalidSignature)?;

        let mut current = hash_leaf(&self.public_key);
        let mut index = self.index;
        for sibling in &self.path {
            current = if index % 2 == 0 {
                hash_pair(&current, sibling)
            } else {
                hash_pair(sibling, &current)
            };
            index /= 2;
        }

        if current == *address.as_bytes() {
            Ok(())
        } else {
            Err(CryptoError::MerkleProofInvalid)
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Exhaustible signing key owned by one autonomous actor
pub struct MerkleSigningKey {
    seed: Seed,
    depth: u32,
    next_index: u64,
    /// levels[0] holds the leaves, the last level holds the root
    levels: Vec<Vec<[u8; HASH_LENGTH]>>,
}

impl MerkleSigningKey {
    /// Build the tree; `start_index` skips leaves already used elsewhere
    pub fn new(seed: Seed, depth: u32, start_index: u64) -> Result<Self, CryptoError> {
        if depth > MAX_DEPTH {
            return Err(CryptoError::UnsupportedDepth(depth));
        }
        let capacity = 1u64 << depth;
        if start_index > capacity {
            return Err(CryptoError::StartIndexOutOfRange {
                index: start_index,
                capacity,
            });
        }

        let leaves: Vec<[u8; HASH_LENGTH]> = (0..capacity)
            .map(|index| {
                let key = derive_signing_key(&seed, index, KeyPurpose::Marker);
                hash_leaf(key.verifying_key().as_bytes())
            })
            .collect();

        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let next = levels[levels.len() - 1]
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], &pair[1]))
                .collect();
            levels.push(next);
        }

        let key = Self {
            seed,
            depth,
            next_index: start_index,
            levels,
        };
        debug!(address = %key.address().short(), depth, start_index, "Merkle signing key built");
        Ok(key)
    }

    /// Root of the tree
    pub fn address(&self) -> Address {
        Address::new(self.levels[self.levels.len() - 1][0])
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Signatures left before exhaustion
    pub fn remaining(&self) -> u64 {
        self.capacity() - self.next_index
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Sign with the next unused leaf
    pub fn sign(&mut self, message: &[u8]) -> Result<MerkleSignature, CryptoError> {
        if self.is_exhausted() {
            return Err(CryptoError::KeyExhausted {
                capacity: self.capacity(),
            });
        }
        let index = self.next_index;
        self.next_index += 1;

        let key = derive_signing_key(&self.seed, index, KeyPurpose::Marker);
        Ok(MerkleSignature {
            index,
            public_key: key.verifying_key().to_bytes(),
            signature: key.sign(message).to_bytes().to_vec(),
            path: self.authentication_path(index),
        })
    }

    fn authentication_path(&self, leaf_index: u64) -> Vec<[u8; HASH_LENGTH]> {
        let mut path = Vec::with_capacity(self.depth as usize);
        let mut index = leaf_index as usize;
        for level in &self.levels[..self.levels.len() - 1] {
            path.push(level[index ^ 1]);
            index /= 2;
        }
        path
    }
}

impl std::fmt::Debug for MerkleSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerkleSigningKey")
            .field("address", &self.address())
            .field("depth", &self.depth)
            .field("next_index", &self.next_index)
            .finish()
    }
}

/// Hash two child nodes to create parent
#[inline]
pub fn hash_pair(left: &[u8; HASH_LENGTH], right: &[u8; HASH_LENGTH]) -> [u8; HASH_LENGTH] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}

/// Hash data to create leaf hash
#[inline]
pub fn hash_leaf(data: &[u8]) -> [u8; HASH_LENGTH] {
    *blake3::hash(data).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(depth: u32) -> MerkleSigningKey {
        MerkleSigningKey::new(Seed::new([3u8; 32]), depth, 0).unwrap()
    }

    #[test]
    fn test_hash_pair_order_matters() {
        let left = [1u8; HASH_LENGTH];
        let right = [2u8; HASH_LENGTH];
        assert_ne!(hash_pair(&left, &right), hash_pair(&right, &left));
    }

    #[test]
    fn test_signatures_verify_against_root() {
        let mut signing_key = key(3);
        let address = signing_key.address();
        for i in 0..8u64 {
            let message = format!("marker {}", i);
            let signature = signing_key.sign(message.as_bytes()).unwrap();
            assert_eq!(signature.index, i);
            assert_eq!(signature.path.len(), 3);
            assert!(signature.verify(message.as_bytes(), &address).is_ok());
        }
    }

    #[test]
    fn test_exhaustion() {
        let mut signing_key = key(1);
        signing_key.sign(b"a").unwrap();
        signing_key.sign(b"b").unwrap();
        assert!(signing_key.is_exhausted());
        assert_eq!(
            signing_key.sign(b"c").unwrap_err(),
            CryptoError::KeyExhausted { capacity: 2 }
        );
    }

    #[test]
    fn test_start_index() {
        let signing_key = MerkleSigningKey::new(Seed::new([3u8; 32]), 2, 3).unwrap();
        assert_eq!(signing_key.remaining(), 1);
        assert_eq!(signing_key.address(), key(2).address());
        assert!(MerkleSigningKey::new(Seed::new([3u8; 32]), 2, 5).is_err());
        assert!(MerkleSigningKey::new(Seed::new([3u8; 32]), MAX_DEPTH + 1, 0).is_err());
    }

    #[test]
    fn test_tampering_detected() {
        let mut signing_key = key(2);
        let address = signing_key.address();
        let signature = signing_key.sign(b"payload").unwrap();

        assert_eq!(
            signature.verify(b"other payload", &address),
            Err(CryptoError::InvalidSignature)
        );
        assert_eq!(
            signature.verify(b"payload", &key(3).address()),
            Err(CryptoError::MerkleProofInvalid)
        );

        let mut wrong_index = signature.clone();
        wrong_index.index = 2;
        assert!(wrong_index.verify(b"payload", &address).is_err());
    }

    #[test]
    fn test_bincode_payload() {
        let mut signing_key = key(2);
        let signature = signing_key.sign(b"payload").unwrap();
        let bytes = signature.to_bytes().unwrap();
        assert_eq!(MerkleSignature::from_bytes(&bytes).unwrap(), signature);
    }

    #[test]
    fn test_depth_zero_single_leaf() {
        let mut signing_key = key(0);
        let address = signing_key.address();
        let signature = signing_key.sign(b"only").unwrap();
        assert!(signature.path.is_empty());
        assert!(signature.verify(b"only", &address).is_ok());
        assert!(signing_key.is_exhausted());
    }
}
