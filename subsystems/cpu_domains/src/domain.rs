//! # CPU Power Domain
//!
//! A group of CPUs behind one power-gating boundary.
//!
//! ```text
//!   PowerDomain
//!   ├── identity      name, id, firmware node     (fixed at creation)
//!   ├── capability    ops, idle states, flags     (fixed at creation)
//!   ├── parent        set once when linked
//!   ├── power state   atomic, written under lock
//!   └── Mutex<DomainInner>
//!         ├── cpus       attached CPUs
//!         ├── idle       attached CPUs currently idle
//!         ├── state_idx  last selected idle state
//!         └── stats
//! ```
//!
//! The inner lock is the per-domain serialization point: evaluation,
//! membership changes and power transitions of one domain never overlap.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use bitflags::bitflags;
use helix_hal::CpuMask;
use spin::{Mutex, MutexGuard, Once};

use crate::ops::PowerOps;
use crate::platform::FwNode;
use crate::state::{DomainPowerState, IdleState, IdleStateTable, MAX_DOMAIN_STATES};

/// Maximum domain name length in bytes
pub const CPU_PD_NAME_MAX: usize = 36;

/// Bounded domain name
pub type DomainName = heapless::String<CPU_PD_NAME_MAX>;

/// Index of a domain in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId(u32);

impl DomainId {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Arena index
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pd{}", self.0)
    }
}

bitflags! {
    /// Domain flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DomainFlags: u32 {
        /// Transitions may run with interrupts disabled
        const IRQ_SAFE   = 1 << 0;
        /// Domain gates CPUs
        const CPU_DOMAIN = 1 << 1;
    }
}

/// Per-domain counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainStats {
    /// Governor evaluations
    pub evaluations: u64,
    /// Evaluations that selected no state
    pub rejected: u64,
    /// Successful power-offs
    pub power_off: u64,
    /// Successful power-ons
    pub power_on: u64,
    /// Firmware calls that failed
    pub transport_failures: u64,
    /// Power-offs per idle state
    pub usage: [u64; MAX_DOMAIN_STATES],
}

pub(crate) struct DomainInner {
    pub(crate) cpus: CpuMask,
    pub(crate) idle: CpuMask,
    pub(crate) state_idx: usize,
    pub(crate) stats: DomainStats,
}

/// CPU power domain
pub struct PowerDomain {
    id: DomainId,
    name: DomainName,
    flags: DomainFlags,
    ops: PowerOps,
    states: IdleStateTable,
    parent: Once<DomainId>,
    node: Once<FwNode>,
    power: AtomicU8,
    inner: Mutex<DomainInner>,
}

/// Truncate `name` to [`CPU_PD_NAME_MAX`] bytes on a char boundary
pub fn bounded_name(name: &str) -> DomainName {
    let mut end = name.len().min(CPU_PD_NAME_MAX);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    DomainName::try_from(&name[..end]).unwrap_or_default()
}

impl PowerDomain {
    pub(crate) fn new(id: DomainId, name: &str, ops: PowerOps, states: IdleStateTable) -> Self {
        Self {
            id,
            name: bounded_name(name),
            flags: DomainFlags::IRQ_SAFE | DomainFlags::CPU_DOMAIN,
            ops,
            states,
            parent: Once::new(),
            node: Once::new(),
            power: AtomicU8::new(DomainPowerState::Active as u8),
            inner: Mutex::new(DomainInner {
                cpus: CpuMask::new(),
                idle: CpuMask::new(),
                state_idx: 0,
                stats: DomainStats::default(),
            }),
        }
    }

    /// Domain id
    #[inline]
    pub fn id(&self) -> DomainId {
        self.id
    }

    /// Domain name
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Domain flags
    #[inline]
    pub fn flags(&self) -> DomainFlags {
        self.flags
    }

    /// Power operations
    #[inline]
    pub fn ops(&self) -> &PowerOps {
        &self.ops
    }

    /// Idle states, shallowest first
    #[inline]
    pub fn idle_states(&self) -> &[IdleState] {
        &self.states
    }

    /// Parent domain
    pub fn parent(&self) -> Option<DomainId> {
        self.parent.get().copied()
    }

    /// Link to `parent`. Fails if already linked.
    pub(crate) fn set_parent(&self, parent: DomainId) -> bool {
        let mut linked = false;
        self.parent.call_once(|| {
            linked = true;
            parent
        });
        linked
    }

    /// Firmware node this domain was created for
    pub fn node(&self) -> Option<FwNode> {
        self.node.get().copied()
    }

    pub(crate) fn set_node(&self, node: FwNode) -> bool {
        let mut bound = false;
        self.node.call_once(|| {
            bound = true;
            node
        });
        bound
    }

    /// Current power state
    #[inline]
    pub fn power_state(&self) -> DomainPowerState {
        DomainPowerState::from_raw(self.power.load(Ordering::Acquire))
    }

    /// Must be called with the inner lock held
    pub(crate) fn set_power_state(&self, _inner: &DomainInner, state: DomainPowerState) {
        self.power.store(state as u8, Ordering::Release);
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DomainInner> {
        self.inner.lock()
    }

    /// Attached CPUs
    pub fn members(&self) -> CpuMask {
        self.inner.lock().cpus
    }

    /// Attached CPUs that are currently idle
    pub fn idle_cpus(&self) -> CpuMask {
        self.inner.lock().idle
    }

    /// Last selected idle state
    pub fn state_idx(&self) -> usize {
        self.inner.lock().state_idx
    }

    /// Counter snapshot
    pub fn stats(&self) -> DomainStats {
        self.inner.lock().stats
    }
}

impl fmt::Debug for PowerDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowerDomain")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent())
            .field("power", &self.power_state())
            .field("ops", &self.ops)
            .field("states", &self.states.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_truncation() {
        let long = "/cpus/power-domains/cluster0-power-domain@0";
        assert_eq!(bounded_name(long).len(), CPU_PD_NAME_MAX);
        assert_eq!(bounded_name("cluster0").as_str(), "cluster0");

        // 35 ASCII bytes then a 2-byte char straddling the limit
        let mut s = "a".repeat(35);
        s.push('é');
        assert_eq!(bounded_name(&s).len(), 35);
    }

    #[test]
    fn test_parent_set_once() {
        let pd = PowerDomain::new(DomainId::from_index(0), "pd", PowerOps::Noop, IdleStateTable::new());
        assert!(pd.flags().contains(DomainFlags::IRQ_SAFE));
        assert_eq!(pd.parent(), None);
        assert!(pd.set_parent(DomainId::from_index(1)));
        assert!(!pd.set_parent(DomainId::from_index(2)));
        assert_eq!(pd.parent(), Some(DomainId::from_index(1)));
    }

    #[test]
    fn test_initial_state() {
        let pd = PowerDomain::new(DomainId::from_index(3), "pd", PowerOps::Noop, IdleStateTable::new());
        assert_eq!(pd.power_state(), DomainPowerState::Active);
        assert!(pd.members().is_empty());
        assert_eq!(pd.stats(), DomainStats::default());
        assert_eq!(std::format!("{}", pd.id()), "pd3");
    }
}
