//! Economic actors
//!
//! Two variants share the [`EconomicActor`] capability:
//! - [`TrustedEconomicActor`]: a followed peer, known only through its markers
//! - [`AutonomousEconomicActor`]: a locally controlled identity that scores
//!   tangles and publishes signed markers

pub mod autonomous;
pub mod marker;
pub mod trusted;

pub use autonomous::{AutonomousEconomicActor, PublishedMarker, TickReport};
pub use marker::Marker;
pub use trusted::TrustedEconomicActor;

use ecluster_common::{Address, Tangle};

/// What every economic actor exposes
pub trait EconomicActor {
    /// Merkle root identifying the actor
    fn address(&self) -> Address;

    /// Tangles the actor has published a marker for
    fn marked_tangles(&self) -> Vec<Tangle>;

    /// Confidence of the actor's latest marker for `tangle`
    fn tangle_confidence(&self, tangle: &Tangle) -> Option<f64>;
}
