//! # Helix Energy Model
//!
//! Static power costs of CPU idle states and performance levels, at core,
//! cluster and system granularity. The scheduler uses them to compare
//! candidate task placements; the idle governor does not consult them.
//!
//! ```text
//!   compatible ──► MODEL_MATCHES ──► EnergyModel
//!                                      ├── core[cluster]    ─► GroupEnergy
//!                                      ├── cluster[cluster] ─► GroupEnergy
//!                                      └── system[cluster]  ─► GroupEnergy
//! ```
//!
//! The model is chosen once at boot and never changes afterwards.

#![no_std]
#![warn(missing_docs)]

#[cfg(test)]
extern crate std;

pub mod model;
pub mod platforms;
pub mod store;

pub use model::{CapacityState, EnergyKind, EnergyModel, GroupEnergy, IdleStateCost};
pub use store::{global, install, load, EnergyError, EnergyModelStore};
