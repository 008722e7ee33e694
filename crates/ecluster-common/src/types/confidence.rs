//! Confidence quantization for marker tags
//!
//! A marker tag is `b"ECMK"` followed by a big-endian `u32` holding the
//! confidence in steps of `1 / CONFIDENCE_RESOLUTION`. Marker publication
//! compares these quantized forms, never raw floats.

use super::transaction::{Tag, TAG_LENGTH};

/// Quantization steps across `[0, 1]`
pub const CONFIDENCE_RESOLUTION: u32 = 1000;

/// Leading tag bytes identifying a marker
pub const MARKER_TAG_PREFIX: [u8; 4] = *b"ECMK";

/// Map a confidence onto the tag's symbol space.
///
/// Values are clamped to `[0, 1]`; NaN maps to 0.
pub fn quantize_confidence(confidence: f64) -> u32 {
    if confidence.is_nan() {
        return 0;
    }
    (confidence.clamp(0.0, 1.0) * CONFIDENCE_RESOLUTION as f64).round() as u32
}

/// Encode a confidence into a marker tag
pub fn encode_confidence(confidence: f64) -> Tag {
    let mut tag = [0u8; TAG_LENGTH];
    tag[..4].copy_from_slice(&MARKER_TAG_PREFIX);
    tag[4..].copy_from_slice(&quantize_confidence(confidence).to_be_bytes());
    tag
}

/// Decode a marker tag back to the bucket's confidence
pub fn decode_confidence(tag: &Tag) -> Option<f64> {
    if !is_marker_tag(tag) {
        return None;
    }
    let mut level = [0u8; 4];
    level.copy_from_slice(&tag[4..]);
    let level = u32::from_be_bytes(level);
    if level > CONFIDENCE_RESOLUTION {
        return None;
    }
    Some(level as f64 / CONFIDENCE_RESOLUTION as f64)
}

pub fn is_marker_tag(tag: &Tag) -> bool {
    tag[..4] == MARKER_TAG_PREFIX
}
