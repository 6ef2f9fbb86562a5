//! # Helix HAL - CPU Power Management Primitives
//!
//! Hardware abstraction used by the CPU power-domain subsystems.
//!
//! ## Components
//!
//! - **CPU masks**: fixed-size, allocation-free CPU bitmaps
//! - **Topology**: MPIDR affinity decoding, cluster ids, online state
//! - **Time**: monotonic nanosecond timestamps
//! - **Firmware**: SMCCC transport (SMC/HVC) and SoC SiP function ids
//!
//! Everything in this crate is usable from interrupt-disabled context: no
//! blocking, no allocation on the call paths.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

#[cfg(test)]
extern crate std;

pub mod firmware;
pub mod smp;
pub mod time;

pub use firmware::{FirmwareCall, SmcccConduit, SmcccTransport};
pub use smp::{CpuId, CpuMask, CpuState, CpuTopology, Mpidr, SmpError, MAX_CPUS};
pub use time::Ktime;
