//! Consensus layer
//!
//! - [`EconomicCluster`]: what trusted peers think of a transaction
//! - [`ConfidenceCalculator`]: what this node should think of competing tangles

pub mod calculator;
pub mod cluster;

pub use calculator::{ConfidenceCalculator, Conflict, MAX_ITERATIONS, TOLERANCE};
pub use cluster::{EconomicCluster, MembershipChange};
