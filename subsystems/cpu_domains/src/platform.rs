//! # Platform Collaborators
//!
//! The shapes this subsystem needs from the rest of the kernel: the
//! firmware description of the domain hierarchy, per-CPU wakeup deadlines
//! and the latency QoS constraint.

use core::sync::atomic::{AtomicU32, Ordering};

use helix_hal::{CpuId, CpuMask, Ktime};

use crate::state::IdleState;

/// Opaque handle of a firmware (device-tree) node
pub type FwNode = u32;

/// Firmware description of CPU power domains
pub trait FirmwareDescription {
    /// Whether the node is administratively enabled
    fn is_available(&self, node: FwNode) -> bool;

    /// Human-readable node name
    fn name(&self, node: FwNode) -> &str;

    /// Declared parent domain, if any
    fn parent(&self, node: FwNode) -> Option<FwNode>;

    /// Domain idle states, shallowest first
    fn idle_states(&self, node: FwNode) -> &[IdleState];

    /// Domain node the CPU's `power-domains` entry points at
    fn cpu_domain(&self, cpu: CpuId) -> Option<FwNode>;

    /// Whether the CPU has a device the domain can be attached to
    fn cpu_device_present(&self, cpu: CpuId) -> bool;

    /// Every CPU the firmware declares
    fn possible_cpus(&self) -> CpuMask;

    /// MTCMOS island backing the node, for firmware-switched domains
    fn mtcmos_id(&self, _node: FwNode) -> Option<u32> {
        None
    }
}

/// Source of per-CPU timer deadlines
pub trait WakeupSource: Send + Sync {
    /// Next scheduled wakeup of `cpu`, or [`Ktime::MAX`] if none
    fn next_wakeup(&self, cpu: CpuId) -> Ktime;
}

/// Read side of the CPU latency QoS constraint
pub trait LatencyQos: Send + Sync {
    /// Maximum tolerated wakeup latency in microseconds; `0` forbids
    /// powering any domain down
    fn max_latency_us(&self) -> u32;
}

// =============================================================================
// PM QOS
// =============================================================================

/// Latency value meaning "no constraint"
pub const PM_QOS_DEFAULT_LATENCY_US: u32 = 2_000_000_000;

/// CPU-DMA latency constraint in a single atomic word.
///
/// Written by the QoS subsystem, read lock-free by the governor. A reader
/// may see a value one update old; the next evaluation picks up the new
/// one.
#[derive(Debug)]
pub struct PmQos {
    latency_us: AtomicU32,
}

impl PmQos {
    /// Constraint at its default (unconstrained) value
    pub const fn new() -> Self {
        Self::with_latency(PM_QOS_DEFAULT_LATENCY_US)
    }

    /// Constraint with an initial value
    pub const fn with_latency(latency_us: u32) -> Self {
        Self {
            latency_us: AtomicU32::new(latency_us),
        }
    }

    /// Update the constraint
    pub fn set_latency_us(&self, latency_us: u32) {
        self.latency_us.store(latency_us, Ordering::Relaxed);
    }

    /// Drop back to the default
    pub fn reset(&self) {
        self.set_latency_us(PM_QOS_DEFAULT_LATENCY_US);
    }
}

impl Default for PmQos {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyQos for PmQos {
    #[inline]
    fn max_latency_us(&self) -> u32 {
        self.latency_us.load(Ordering::Relaxed)
    }
}

/// System-wide CPU-DMA latency constraint
pub static PM_QOS_CPU_DMA_LATENCY: PmQos = PmQos::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pm_qos_update() {
        let qos = PmQos::default();
        assert_eq!(qos.max_latency_us(), PM_QOS_DEFAULT_LATENCY_US);
        qos.set_latency_us(0);
        assert_eq!(qos.max_latency_us(), 0);
        qos.reset();
        assert_eq!(qos.max_latency_us(), PM_QOS_DEFAULT_LATENCY_US);
    }

    #[test]
    fn test_global_constraint_default() {
        let qos: &dyn LatencyQos = &PM_QOS_CPU_DMA_LATENCY;
        assert_eq!(qos.max_latency_us(), PM_QOS_DEFAULT_LATENCY_US);
    }
}
