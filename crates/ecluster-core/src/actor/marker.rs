//! Marker codec
//!
//! A marker is a zero-value transaction:
//! - trunk/branch carry the marked tangle's ref1/ref2
//! - address is the issuing actor (its merkle root)
//! - tag carries the quantized confidence
//! - payload is the bincode-encoded [`MerkleSignature`] over
//!   `ref1 || ref2 || tag || address`

use ecluster_common::crypto::{MerkleSignature, MerkleSigningKey};
use ecluster_common::{
    decode_confidence, encode_confidence, Address, MarkerError, Result, Tag, Tangle, Transaction,
    TransactionBuilder, TransactionRef,
};

/// A decoded, signature-checked marker
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub tangle: Tangle,
    /// Confidence as encoded in the tag (quantized)
    pub confidence: f64,
    pub issuer: Address,
    /// Signing key index; later markers of one issuer carry higher indices
    pub index: u64,
    pub hash: TransactionRef,
}

fn signing_message(tangle: &Tangle, tag: &Tag, issuer: &Address) -> Vec<u8> {
    let mut message = Vec::with_capacity(64 + tag.len() + 32);
    message.extend_from_slice(&tangle.to_bytes());
    message.extend_from_slice(tag);
    message.extend_from_slice(issuer.as_bytes());
    message
}

impl Marker {
    /// Sign a marker transaction with the next index of `signing_key`
    pub fn build(
        signing_key: &mut MerkleSigningKey,
        tangle: Tangle,
        confidence: f64,
    ) -> Result<Transaction> {
        let issuer = signing_key.address();
        let tag = encode_confidence(confidence);
        let message = signing_message(&tangle, &tag, &issuer);
        let signature = signing_key.sign(&message)?;

        Ok(TransactionBuilder::new()
            .trunk(tangle.ref1())
            .branch(tangle.ref2())
            .address(issuer)
            .tag(tag)
            .payload(signature.to_bytes()?)
            .bundle(TransactionRef::digest(&message))
            .build())
    }

    /// Decode and verify a marker transaction
    pub fn decode(transaction: &Transaction) -> std::result::Result<Self, MarkerError> {
        if transaction.is_value_transaction() {
            return Err(MarkerError::NotAMarker);
        }
        let confidence = decode_confidence(&transaction.tag).ok_or(MarkerError::NotAMarker)?;
        let signature = MerkleSignature::from_bytes(&transaction.payload)
            .map_err(|e| MarkerError::InvalidPayload(e.to_string()))?;

        let tangle = Tangle::new(transaction.trunk, transaction.branch);
        let message = signing_message(&tangle, &transaction.tag, &transaction.address);
        signature
            .verify(&message, &transaction.address)
            .map_err(|_| MarkerError::SignatureMismatch {
                address: transaction.address.to_hex(),
            })?;

        Ok(Self {
            tangle,
            confidence,
            issuer: transaction.address,
            index: signature.index,
            hash: transaction.hash,
        })
    }
}
