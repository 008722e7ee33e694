//! # EC Node
//!
//! Runs the economic clustering engine as a long-lived service:
//! - [`service::EcNode`]: actor registry, trust, balances and transfers
//! - [`persistence::TrustStore`]: trust list on disk
//! - [`config::NodeConfig`]: environment configuration

pub mod config;
pub mod persistence;
pub mod service;

pub use config::NodeConfig;
pub use persistence::{PersistedState, TrustEntry, TrustStore};
pub use service::EcNode;

/// Node version
pub const NODE_VERSION: &str = env!("CARGO_PKG_VERSION");
