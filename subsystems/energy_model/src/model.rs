//! # Energy Model Types
//!
//! There are no unit requirements for the data. Costs can be normalized to
//! any reference point as long as the normalization is the same for every
//! table of a platform.

/// Power cost of one hardware idle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleStateCost {
    /// Relative power while in the state
    pub power: u64,
}

/// Power cost at one performance level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityState {
    /// Compute capacity (1024 = biggest CPU at max frequency)
    pub cap: u64,
    /// Relative power while busy at this capacity
    pub power: u64,
}

/// Energy data for one scheduling group (a core, a cluster or the system)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupEnergy {
    /// Index-aligned with the hardware idle-state enumeration
    pub idle_states: &'static [IdleStateCost],
    /// Sorted ascending by capacity
    pub cap_states: &'static [CapacityState],
}

impl GroupEnergy {
    /// Number of idle states
    #[inline]
    pub const fn nr_idle_states(&self) -> usize {
        self.idle_states.len()
    }

    /// Number of capacity states
    #[inline]
    pub const fn nr_cap_states(&self) -> usize {
        self.cap_states.len()
    }

    /// Highest capacity this group can deliver
    pub fn max_capacity(&self) -> u64 {
        self.cap_states.last().map_or(0, |s| s.cap)
    }

    /// Lowest capacity state able to serve `util`, or the highest one if
    /// none can
    pub fn find_cap_state(&self, util: u64) -> Option<&'static CapacityState> {
        let states = self.cap_states;
        states
            .iter()
            .find(|s| s.cap >= util)
            .or_else(|| states.last())
    }

    /// Busy power when running `util` worth of capacity
    pub fn busy_power(&self, util: u64) -> Option<u64> {
        self.find_cap_state(util).map(|s| s.power)
    }

    /// Idle power in state `idx`; indices past the table clamp to the
    /// deepest entry
    pub fn idle_power(&self, idx: usize) -> Option<u64> {
        let states = self.idle_states;
        states
            .get(idx)
            .or_else(|| states.last())
            .map(|s| s.power)
    }
}

/// Granularity of an energy table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnergyKind {
    /// Per-core costs
    Core,
    /// Per-cluster costs
    Cluster,
    /// System-level costs
    System,
}

/// Number of cluster slots in every table
pub const NR_CLUSTER_SLOTS: usize = 3;

/// Per-cluster lookup table; a `None` slot has no data
pub type EnergyTable = [Option<&'static GroupEnergy>; NR_CLUSTER_SLOTS];

/// Energy tables for one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyModel {
    /// Per-core energy, by cluster id
    pub core: EnergyTable,
    /// Per-cluster energy, by cluster id
    pub cluster: EnergyTable,
    /// System energy, by cluster id (all `None` on most platforms)
    pub system: EnergyTable,
}

impl EnergyModel {
    /// Table for `kind`
    #[inline]
    pub const fn table(&self, kind: EnergyKind) -> &EnergyTable {
        match kind {
            EnergyKind::Core => &self.core,
            EnergyKind::Cluster => &self.cluster,
            EnergyKind::System => &self.system,
        }
    }
}

/// Check that capacity states are strictly ascending
pub(crate) const fn caps_ascending(states: &[CapacityState]) -> bool {
    let mut i = 1;
    while i < states.len() {
        if states[i - 1].cap >= states[i].cap {
            return false;
        }
        i += 1;
    }
    true
}
