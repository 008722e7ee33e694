//! Fixed-length ledger hashes
//!
//! Transaction references and addresses are both 32-byte BLAKE3 outputs.
//! They are shown as lowercase hex and serialized as hex strings so the
//! persisted trust list stays human-editable.

use crate::error::MalformedInput;
use serde::{Deserialize, Serialize};

/// Hash size in bytes (BLAKE3 output)
pub const HASH_LENGTH: usize = 32;

macro_rules! ledger_hash {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name([u8; HASH_LENGTH]);

        impl $name {
            /// The all-zero value
            pub const NULL: Self = Self([0u8; HASH_LENGTH]);

            pub const fn new(bytes: [u8; HASH_LENGTH]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
                &self.0
            }

            pub fn is_null(&self) -> bool {
                self.0 == [0u8; HASH_LENGTH]
            }

            /// Parse from a byte slice of exactly [`HASH_LENGTH`] bytes
            pub fn from_slice(bytes: &[u8]) -> Result<Self, MalformedInput> {
                let array: [u8; HASH_LENGTH] =
                    bytes.try_into().map_err(|_| MalformedInput::InvalidLength {
                        what: $what,
                        expected: HASH_LENGTH,
                        actual: bytes.len(),
                    })?;
                Ok(Self(array))
            }

            /// Parse from 64 hex characters
            pub fn from_hex(text: &str) -> Result<Self, MalformedInput> {
                let bytes =
                    hex::decode(text).map_err(|e| MalformedInput::InvalidHex(e.to_string()))?;
                Self::from_slice(&bytes)
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// First bytes as hex, for log lines
            pub fn short(&self) -> String {
                hex::encode(&self.0[..5])
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({}..)", stringify!($name), self.short())
            }
        }

        impl std::str::FromStr for $name {
            type Err = MalformedInput;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = MalformedInput;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_hex(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_hex()
            }
        }
    };
}

ledger_hash!(
    /// Reference to a ledger transaction (its hash)
    TransactionRef,
    "transaction reference"
);

ledger_hash!(
    /// Ledger address: a merkle root for economic actors, a key hash for value holders
    Address,
    "address"
);

impl TransactionRef {
    /// Hash arbitrary data into a reference
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }
}
