//! TrustWeight - how much a peer actor's markers count (0-1)
//!
//! A weight of zero means "not trusted" and removes the peer from the
//! cluster; any positive weight keeps it as a member.

use crate::error::MalformedInput;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TrustWeight(f64);

impl TrustWeight {
    pub const ZERO: Self = Self(0.0);
    pub const FULL: Self = Self(1.0);

    /// Validate a raw weight
    pub fn new(weight: f64) -> Result<Self, MalformedInput> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(MalformedInput::TrustOutOfRange(weight));
        }
        Ok(Self(weight))
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl TryFrom<f64> for TrustWeight {
    type Error = MalformedInput;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrustWeight> for f64 {
    fn from(value: TrustWeight) -> Self {
        value.0
    }
}

impl std::fmt::Display for TrustWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range() {
        assert!(TrustWeight::new(0.0).unwrap().is_zero());
        assert_eq!(TrustWeight::new(0.4).unwrap().value(), 0.4);
        assert!(TrustWeight::new(1.01).is_err());
        assert!(TrustWeight::new(-0.1).is_err());
        assert!(TrustWeight::new(f64::NAN).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<TrustWeight>("0.75").is_ok());
        assert!(serde_json::from_str::<TrustWeight>("2.0").is_err());
    }
}
