//! # MPIDR (Multiprocessor Affinity Register)
//!
//! Decoding of the MPIDR_EL1 affinity fields. The power-domain code only
//! needs the cluster level: energy tables are indexed by cluster id.
//!
//! ```text
//! 63                             40 39   32 31 30 29   25 24 23    16 15     8 7      0
//! ┌─────────────────────────────────┬───────┬──┬──┬───────┬──┬────────┬────────┬────────┐
//! │             RES0                │ Aff3  │1 │U │ RES0  │MT│  Aff2  │  Aff1  │  Aff0  │
//! └─────────────────────────────────┴───────┴──┴──┴───────┴──┴────────┴────────┴────────┘
//! ```

/// Aff0 mask (bits 0-7)
pub const MPIDR_AFF0_MASK: u64 = 0xFF;

/// Aff1 mask (bits 8-15)
pub const MPIDR_AFF1_MASK: u64 = 0xFF << 8;

/// Aff1 shift
pub const MPIDR_AFF1_SHIFT: u64 = 8;

/// Aff2 mask (bits 16-23)
pub const MPIDR_AFF2_MASK: u64 = 0xFF << 16;

/// Aff2 shift
pub const MPIDR_AFF2_SHIFT: u64 = 16;

/// Aff3 mask (bits 32-39)
pub const MPIDR_AFF3_MASK: u64 = 0xFF << 32;

/// Aff3 shift
pub const MPIDR_AFF3_SHIFT: u64 = 32;

/// Multithreading bit (bit 24)
pub const MPIDR_MT: u64 = 1 << 24;

/// Full affinity mask (Aff0-Aff3)
pub const MPIDR_AFFINITY_MASK: u64 =
    MPIDR_AFF0_MASK | MPIDR_AFF1_MASK | MPIDR_AFF2_MASK | MPIDR_AFF3_MASK;

/// MPIDR register wrapper
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Mpidr(u64);

impl Mpidr {
    /// Create from raw value
    #[inline]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Create from affinity levels
    #[inline]
    pub const fn from_affinity(aff3: u8, aff2: u8, aff1: u8, aff0: u8) -> Self {
        Self(
            (aff0 as u64)
                | ((aff1 as u64) << MPIDR_AFF1_SHIFT)
                | ((aff2 as u64) << MPIDR_AFF2_SHIFT)
                | ((aff3 as u64) << MPIDR_AFF3_SHIFT),
        )
    }

    /// Read the current CPU's MPIDR
    #[cfg(all(feature = "aarch64", target_arch = "aarch64"))]
    #[inline]
    pub fn current() -> Self {
        let value: u64;
        // SAFETY: MPIDR_EL1 is a read-only identification register.
        unsafe {
            core::arch::asm!("mrs {}, mpidr_el1", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        Self(value)
    }

    /// Get the raw MPIDR value
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Get the full affinity value (Aff0-Aff3)
    #[inline]
    pub const fn affinity(self) -> u64 {
        self.0 & MPIDR_AFFINITY_MASK
    }

    /// Get affinity level 0 (core)
    #[inline]
    pub const fn aff0(self) -> u8 {
        (self.0 & MPIDR_AFF0_MASK) as u8
    }

    /// Get affinity level 1 (cluster)
    #[inline]
    pub const fn aff1(self) -> u8 {
        ((self.0 & MPIDR_AFF1_MASK) >> MPIDR_AFF1_SHIFT) as u8
    }

    /// Get affinity level 2 (socket/die)
    #[inline]
    pub const fn aff2(self) -> u8 {
        ((self.0 & MPIDR_AFF2_MASK) >> MPIDR_AFF2_SHIFT) as u8
    }

    /// Get affinity level 3 (node)
    #[inline]
    pub const fn aff3(self) -> u8 {
        ((self.0 & MPIDR_AFF3_MASK) >> MPIDR_AFF3_SHIFT) as u8
    }

    /// Check if multithreading is indicated
    #[inline]
    pub const fn is_multithreaded(self) -> bool {
        (self.0 & MPIDR_MT) != 0
    }

    /// Cluster id.
    ///
    /// With MT set, Aff0 is the thread and Aff1 the core, so the cluster
    /// moves up to Aff2.
    #[inline]
    pub const fn cluster_id(self) -> u8 {
        if self.is_multithreaded() {
            self.aff2()
        } else {
            self.aff1()
        }
    }

    /// Core id within the cluster
    #[inline]
    pub const fn core_id(self) -> u8 {
        if self.is_multithreaded() {
            self.aff1()
        } else {
            self.aff0()
        }
    }

    /// Check if two MPIDRs are on the same cluster
    #[inline]
    pub const fn same_cluster(self, other: Self) -> bool {
        self.cluster_id() == other.cluster_id()
            && self.aff3() == other.aff3()
            && (self.is_multithreaded() || self.aff2() == other.aff2())
    }
}

impl core::fmt::Debug for Mpidr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Mpidr")
            .field("aff3", &self.aff3())
            .field("aff2", &self.aff2())
            .field("aff1", &self.aff1())
            .field("aff0", &self.aff0())
            .field("mt", &self.is_multithreaded())
            .finish()
    }
}

impl core::fmt::Display for Mpidr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.aff3(),
            self.aff2(),
            self.aff1(),
            self.aff0()
        )
    }
}
