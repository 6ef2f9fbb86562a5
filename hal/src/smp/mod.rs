//! # SMP Topology
//!
//! CPU enumeration for power management: which CPUs exist, which cluster
//! they sit in, and whether they are currently online.
//!
//! ```text
//!   Cluster 0 (Aff1=0)          Cluster 1 (Aff1=1)
//!  ┌──────┐ ┌──────┐           ┌──────┐ ┌──────┐
//!  │CPU 0 │ │CPU 1 │           │CPU 4 │ │CPU 5 │
//!  └──────┘ └──────┘           └──────┘ └──────┘
//!  ┌──────┐ ┌──────┐           ┌──────┐ ┌──────┐
//!  │CPU 2 │ │CPU 3 │           │CPU 6 │ │CPU 7 │
//!  └──────┘ └──────┘           └──────┘ └──────┘
//! ```
//!
//! The topology is shared by every CPU. All state is held in atomics so
//! the idle path can query it without taking a lock; hotplug writes a
//! single word per transition.

pub mod cpumask;
pub mod mpidr;

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};

pub use cpumask::CpuMask;
pub use mpidr::Mpidr;

// ============================================================================
// SMP Constants
// ============================================================================

/// Maximum number of supported CPUs
pub const MAX_CPUS: usize = 256;

/// Linear CPU identifier (0, 1, 2, ...)
pub type CpuId = u32;

// ============================================================================
// CPU State
// ============================================================================

/// CPU operational state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CpuState {
    /// CPU is offline (not started or hot-unplugged)
    Offline  = 0,
    /// CPU is in the process of coming online
    Starting = 1,
    /// CPU is online and running
    Online   = 2,
    /// CPU is going offline
    Stopping = 3,
    /// CPU is in an idle state (low power)
    Idle     = 4,
    /// CPU has encountered a fatal error
    Dead     = 5,
}

impl CpuState {
    /// Check if the CPU is usable (online or idle)
    #[inline]
    pub const fn is_active(self) -> bool {
        matches!(self, CpuState::Online | CpuState::Idle)
    }

    const fn from_raw(value: u8) -> Self {
        match value {
            1 => CpuState::Starting,
            2 => CpuState::Online,
            3 => CpuState::Stopping,
            4 => CpuState::Idle,
            5 => CpuState::Dead,
            _ => CpuState::Offline,
        }
    }
}

/// SMP operation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmpError {
    /// CPU id out of range or never registered
    InvalidCpu,
}

// ============================================================================
// Topology
// ============================================================================

struct CpuSlot {
    present: AtomicBool,
    mpidr: AtomicU64,
    state: AtomicU8,
}

impl CpuSlot {
    const fn new() -> Self {
        Self {
            present: AtomicBool::new(false),
            mpidr: AtomicU64::new(0),
            state: AtomicU8::new(CpuState::Offline as u8),
        }
    }
}

/// System CPU topology
pub struct CpuTopology {
    slots: [CpuSlot; MAX_CPUS],
    num_cpus: AtomicU32,
}

impl CpuTopology {
    /// Create an empty topology
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const EMPTY: CpuSlot = CpuSlot::new();
        Self {
            slots: [EMPTY; MAX_CPUS],
            num_cpus: AtomicU32::new(0),
        }
    }

    fn slot(&self, cpu: CpuId) -> Option<&CpuSlot> {
        self.slots.get(cpu as usize)
    }

    fn present_slot(&self, cpu: CpuId) -> Option<&CpuSlot> {
        self.slot(cpu)
            .filter(|slot| slot.present.load(Ordering::Acquire))
    }

    /// Register a possible CPU from the firmware description.
    ///
    /// The CPU starts offline. Registering the same id again only updates
    /// its MPIDR.
    pub fn register_cpu(&self, cpu: CpuId, mpidr: Mpidr) -> Result<(), SmpError> {
        let slot = self.slot(cpu).ok_or(SmpError::InvalidCpu)?;
        slot.mpidr.store(mpidr.value(), Ordering::Relaxed);
        if !slot.present.swap(true, Ordering::AcqRel) {
            self.num_cpus.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Number of registered (possible) CPUs
    pub fn num_cpus(&self) -> u32 {
        self.num_cpus.load(Ordering::Relaxed)
    }

    /// Check if a CPU was registered
    pub fn is_present(&self, cpu: CpuId) -> bool {
        self.present_slot(cpu).is_some()
    }

    /// Affinity of a registered CPU
    pub fn mpidr(&self, cpu: CpuId) -> Option<Mpidr> {
        self.present_slot(cpu)
            .map(|slot| Mpidr::from_raw(slot.mpidr.load(Ordering::Relaxed)))
    }

    /// Cluster id of a registered CPU
    pub fn cluster_id(&self, cpu: CpuId) -> Option<u8> {
        self.mpidr(cpu).map(Mpidr::cluster_id)
    }

    /// Current state; unregistered CPUs report `Offline`
    pub fn state(&self, cpu: CpuId) -> CpuState {
        self.present_slot(cpu)
            .map(|slot| CpuState::from_raw(slot.state.load(Ordering::Acquire)))
            .unwrap_or(CpuState::Offline)
    }

    /// Move a CPU to a new state, returning the previous one
    pub fn set_state(&self, cpu: CpuId, state: CpuState) -> Result<CpuState, SmpError> {
        let slot = self.present_slot(cpu).ok_or(SmpError::InvalidCpu)?;
        let prev = slot.state.swap(state as u8, Ordering::AcqRel);
        Ok(CpuState::from_raw(prev))
    }

    /// Check if a CPU is online (running or idle)
    #[inline]
    pub fn is_online(&self, cpu: CpuId) -> bool {
        self.state(cpu).is_active()
    }

    /// Mask of registered CPUs
    pub fn possible_mask(&self) -> CpuMask {
        (0..MAX_CPUS as CpuId)
            .filter(|&cpu| self.is_present(cpu))
            .collect()
    }

    /// Mask of online CPUs
    pub fn online_mask(&self) -> CpuMask {
        (0..MAX_CPUS as CpuId)
            .filter(|&cpu| self.is_online(cpu))
            .collect()
    }
}

impl Default for CpuTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for CpuTopology {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CpuTopology")
            .field("num_cpus", &self.num_cpus())
            .field("online", &self.online_mask())
            .finish()
    }
}
