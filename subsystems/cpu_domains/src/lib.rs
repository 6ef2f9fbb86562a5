//! # Helix CPU Power Domains
//!
//! Hierarchical CPU power-domain management: which groups of CPUs share a
//! power rail, when a group may be switched off and how deep.
//!
//! ```text
//!   ┌────────────────────────────────────────────────────────────┐
//!   │                    CpuPowerController                      │
//!   │      idle enter/exit, hotplug online/offline               │
//!   └───────┬─────────────────────┬──────────────────────┬───────┘
//!           │                     │                      │
//!   ┌───────▼───────┐    ┌────────▼────────┐    ┌────────▼────────┐
//!   │  DomainTree   │    │    Governor     │    │     Driver      │
//!   │ arena, links, │    │ wakeups + QoS   │    │ PowerOps: noop, │
//!   │ CPU masks     │    │ ─► idle state   │    │ SiP firmware    │
//!   └───────▲───────┘    └─────────────────┘    └─────────────────┘
//!           │
//!   ┌───────┴───────┐
//!   │     setup     │  built at boot from the firmware description
//!   └───────────────┘
//! ```
//!
//! Decisions run inline on the CPU that is about to idle, with interrupts
//! disabled: nothing on the idle path blocks or allocates.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod controller;
pub mod domain;
pub mod driver;
pub mod error;
pub mod governor;
pub mod ops;
pub mod platform;
pub mod setup;
pub mod state;
pub mod tree;

use static_assertions::{assert_impl_all, const_assert};

pub use controller::{CpuPowerController, PowerDown};
pub use domain::{DomainFlags, DomainId, DomainStats, PowerDomain, CPU_PD_NAME_MAX};
pub use driver::{power_off, power_on};
pub use error::{PdError, PdResult};
pub use governor::{evaluate_down, select_state, GovernorContext};
pub use ops::{CpuPdOps, FirmwareOps, PowerOps};
pub use platform::{
    FirmwareDescription, FwNode, LatencyQos, PmQos, WakeupSource, PM_QOS_CPU_DMA_LATENCY,
    PM_QOS_DEFAULT_LATENCY_US,
};
pub use setup::{setup_all_cpus, setup_cpu};
pub use state::{DomainPowerState, IdleState, IdleStateTable, MAX_DOMAIN_STATES};
pub use tree::DomainTree;

const_assert!(MAX_DOMAIN_STATES <= u8::MAX as usize);
assert_impl_all!(PowerDomain: Send, Sync);
assert_impl_all!(DomainTree: Send, Sync);
assert_impl_all!(PowerOps: Send, Sync, Clone);
