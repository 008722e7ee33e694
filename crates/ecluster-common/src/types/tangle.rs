//! Tangle - a candidate pair of tip references
//!
//! A tangle names the ledger state implied by two tips. Its identity is the
//! concatenation `ref1 || ref2`, so its textual id is 128 hex characters.

use super::hash::{TransactionRef, HASH_LENGTH};
use crate::error::MalformedInput;
use serde::{Deserialize, Serialize};

/// Length of a tangle id in bytes
pub const TANGLE_ID_LENGTH: usize = 2 * HASH_LENGTH;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tangle {
    ref1: TransactionRef,
    ref2: TransactionRef,
}

impl Tangle {
    pub fn new(ref1: TransactionRef, ref2: TransactionRef) -> Self {
        Self { ref1, ref2 }
    }

    pub fn ref1(&self) -> TransactionRef {
        self.ref1
    }

    pub fn ref2(&self) -> TransactionRef {
        self.ref2
    }

    pub fn references(&self) -> [TransactionRef; 2] {
        [self.ref1, self.ref2]
    }

    /// Parse the concatenated byte form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedInput> {
        if bytes.len() != TANGLE_ID_LENGTH {
            return Err(MalformedInput::InvalidLength {
                what: "tangle",
                expected: TANGLE_ID_LENGTH,
                actual: bytes.len(),
            });
        }
        let (first, second) = bytes.split_at(HASH_LENGTH);
        Ok(Self {
            ref1: TransactionRef::from_slice(first)?,
            ref2: TransactionRef::from_slice(second)?,
        })
    }

    /// Parse the 128-character hex id
    pub fn parse(id: &str) -> Result<Self, MalformedInput> {
        let bytes = hex::decode(id).map_err(|e| MalformedInput::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; TANGLE_ID_LENGTH] {
        let mut bytes = [0u8; TANGLE_ID_LENGTH];
        bytes[..HASH_LENGTH].copy_from_slice(self.ref1.as_bytes());
        bytes[HASH_LENGTH..].copy_from_slice(self.ref2.as_bytes());
        bytes
    }

    pub fn id(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl std::fmt::Display for Tangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id())
    }
}

impl std::fmt::Debug for Tangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tangle({}..|{}..)", self.ref1.short(), self.ref2.short())
    }
}

impl std::str::FromStr for Tangle {
    type Err = MalformedInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_concatenation() {
        let a = TransactionRef::digest(b"a");
        let b = TransactionRef::digest(b"b");
        let tangle = Tangle::new(a, b);
        assert_eq!(tangle.id(), format!("{}{}", a.to_hex(), b.to_hex()));
        assert_eq!(Tangle::parse(&tangle.id()).unwrap(), tangle);
        assert_ne!(tangle, Tangle::new(b, a));
    }

    #[test]
    fn test_malformed_length() {
        let short = "ab".repeat(TANGLE_ID_LENGTH - 1);
        assert_eq!(
            Tangle::parse(&short).unwrap_err(),
            MalformedInput::InvalidLength {
                what: "tangle",
                expected: TANGLE_ID_LENGTH,
                actual: TANGLE_ID_LENGTH - 1,
            }
        );
        assert!(Tangle::from_bytes(&[0u8; TANGLE_ID_LENGTH + 1]).is_err());
    }
}
