//! # Domain Idle States
//!
//! Every domain carries a table of the low-power states it can enter,
//! ordered shallowest (index 0) to deepest. A state is worth entering only
//! if the domain stays down for at least its break-even time:
//!
//! ```text
//!   break_even = power_off_latency + power_on_latency + residency
//! ```

use arrayvec::ArrayVec;
use helix_hal::time::NSEC_PER_USEC;

use crate::error::{PdError, PdResult};

/// Maximum idle states per domain
pub const MAX_DOMAIN_STATES: usize = 8;

/// One domain idle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdleState {
    /// Time to power the domain down (ns)
    pub power_off_latency_ns: u64,
    /// Time to power the domain back up (ns)
    pub power_on_latency_ns: u64,
    /// Minimum residency for the state to pay off (ns)
    pub residency_ns: u64,
    /// Platform argument passed to the power-off operation
    pub param: u32,
}

impl IdleState {
    /// State from nanosecond latencies
    pub const fn new(power_off_latency_ns: u64, power_on_latency_ns: u64, residency_ns: u64) -> Self {
        Self {
            power_off_latency_ns,
            power_on_latency_ns,
            residency_ns,
            param: 0,
        }
    }

    /// State from microsecond latencies, as firmware tables usually give them
    pub const fn from_us(power_off_us: u64, power_on_us: u64, residency_us: u64) -> Self {
        let ns = NSEC_PER_USEC as u64;
        Self::new(
            power_off_us.saturating_mul(ns),
            power_on_us.saturating_mul(ns),
            residency_us.saturating_mul(ns),
        )
    }

    /// Set the platform parameter
    pub const fn with_param(mut self, param: u32) -> Self {
        self.param = param;
        self
    }

    /// Total time the state has to be held to be worthwhile (ns)
    #[inline]
    pub const fn break_even_ns(&self) -> u64 {
        self.power_off_latency_ns
            .saturating_add(self.power_on_latency_ns)
            .saturating_add(self.residency_ns)
    }
}

/// Idle-state table of one domain
pub type IdleStateTable = ArrayVec<IdleState, MAX_DOMAIN_STATES>;

/// Copy `states` into a bounded table
pub fn idle_state_table(states: &[IdleState]) -> PdResult<IdleStateTable> {
    let mut table = IdleStateTable::new();
    table
        .try_extend_from_slice(states)
        .map_err(|_| PdError::TreeConstructionFailure("too many idle states"))?;
    Ok(table)
}

/// Runtime power state of a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DomainPowerState {
    /// Powered and running
    Active      = 0,
    /// Governor is choosing a state
    Evaluating  = 1,
    /// Powered down in the selected state
    PoweredOff  = 2,
}

impl DomainPowerState {
    pub(crate) const fn from_raw(value: u8) -> Self {
        match value {
            1 => DomainPowerState::Evaluating,
            2 => DomainPowerState::PoweredOff,
            _ => DomainPowerState::Active,
        }
    }
}
