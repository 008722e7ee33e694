//! # EC Core
//!
//! Economic clustering engine: decides how confident this node is in
//! competing ledger tips and publishes that confidence as signed markers.
//!
//! ## Components
//!
//! - **Ledger**: host ledger boundary and past cone tracing
//! - **Validation**: balance-tracing double spend detection
//! - **Consensus**: trust-weighted cluster opinion and the confidence calculator
//! - **Actor**: trusted peers and the autonomous, publishing actor
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  AutonomousEconomicActor                     │
//! │   gather ──> validate ──> score ──> publish                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐  │
//! │  │ EconomicCluster│  │LedgerValidator │  │  Confidence    │  │
//! │  │ (trusted peers)│  │ (past cones)   │  │  Calculator    │  │
//! │  └───────┬────────┘  └───────┬────────┘  └────────────────┘  │
//! │          └─────── HostLedger ┘                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod actor;
pub mod consensus;
pub mod ledger;
pub mod validation;

pub use actor::{
    AutonomousEconomicActor, EconomicActor, Marker, PublishedMarker, TickReport,
    TrustedEconomicActor,
};
pub use consensus::{ConfidenceCalculator, Conflict, EconomicCluster, MembershipChange};
pub use ledger::{HostLedger, InMemoryLedger};
pub use validation::LedgerValidator;

use ecluster_common::{DEFAULT_AGGRESSIVITY, DEFAULT_CONSERVATIVITY};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-actor tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Boost for the incumbent most-confident tangle (seed × (1 + aggressivity))
    pub aggressivity: f64,
    /// Damping divisor for published confidence changes
    pub conservativity: f64,
    /// Upper bound on a single marker submission
    pub submit_timeout: Duration,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            aggressivity: DEFAULT_AGGRESSIVITY,
            conservativity: DEFAULT_CONSERVATIVITY,
            submit_timeout: Duration::from_secs(5),
        }
    }
}
