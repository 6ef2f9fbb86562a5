//! Raw SMC/HVC instructions.
//!
//! Only aarch64 builds with the `aarch64` feature trap into firmware. Other
//! builds (host tests, other architectures) answer `NOT_SUPPORTED`, the
//! same code a missing SiP service returns.

cfg_if::cfg_if! {
    if #[cfg(all(feature = "aarch64", target_arch = "aarch64"))] {
        /// Make SMC call
        #[inline]
        pub(super) unsafe fn smc_call(func: u32, arg0: u64, arg1: u64, arg2: u64) -> i64 {
            let result: i64;
            // SAFETY: the caller guarantees a secure monitor is present.
            unsafe {
                core::arch::asm!(
                    "smc #0",
                    inout("x0") func as u64 => result,
                    inout("x1") arg0 => _,
                    inout("x2") arg1 => _,
                    inout("x3") arg2 => _,
                    out("x4") _,
                    out("x5") _,
                    out("x6") _,
                    out("x7") _,
                    options(nomem, nostack)
                );
            }
            result
        }

        /// Make HVC call
        #[inline]
        pub(super) unsafe fn hvc_call(func: u32, arg0: u64, arg1: u64, arg2: u64) -> i64 {
            let result: i64;
            // SAFETY: the caller guarantees a hypervisor is present.
            unsafe {
                core::arch::asm!(
                    "hvc #0",
                    inout("x0") func as u64 => result,
                    inout("x1") arg0 => _,
                    inout("x2") arg1 => _,
                    inout("x3") arg2 => _,
                    out("x4") _,
                    out("x5") _,
                    out("x6") _,
                    out("x7") _,
                    options(nomem, nostack)
                );
            }
            result
        }
    } else {
        use super::SMCCC_RET_NOT_SUPPORTED;

        #[inline]
        pub(super) unsafe fn smc_call(_func: u32, _arg0: u64, _arg1: u64, _arg2: u64) -> i64 {
            SMCCC_RET_NOT_SUPPORTED
        }

        #[inline]
        pub(super) unsafe fn hvc_call(_func: u32, _arg0: u64, _arg1: u64, _arg2: u64) -> i64 {
            SMCCC_RET_NOT_SUPPORTED
        }
    }
}
