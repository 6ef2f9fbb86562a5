//! # Domain Power Operations
//!
//! How a domain is actually switched on and off. The capability is chosen
//! when the domain is created:
//!
//! - [`PowerOps::Noop`]: bookkeeping only, firmware handles the domain
//!   implicitly (e.g. PSCI OS-initiated mode)
//! - [`PowerOps::Firmware`]: MediaTek SiP MTCMOS calls
//! - [`PowerOps::Custom`]: any platform implementation of [`CpuPdOps`]
//!
//! All operations run on the idle path with interrupts disabled. They must
//! not block or allocate.

use alloc::sync::Arc;
use core::fmt;

use helix_hal::firmware::mtk_sip::{
    mtcmos_supported, mtk_sip_simple_call, MTK_SIP_PWR_OFF_MTCMOS, MTK_SIP_PWR_ON_MTCMOS,
};
use helix_hal::firmware::SMCCC_RET_SUCCESS;
use helix_hal::{CpuMask, FirmwareCall};

use crate::error::{PdError, PdResult};

/// Platform power-on/power-off callbacks of a domain
pub trait CpuPdOps: Send + Sync {
    /// Power the domain up
    fn power_on(&self) -> PdResult<()>;

    /// Power the domain down into `state_idx`
    fn power_off(&self, state_idx: usize, param: u32, cpus: &CpuMask) -> PdResult<()>;
}

// =============================================================================
// FIRMWARE OPS
// =============================================================================

/// MTCMOS power island switched through MediaTek SiP calls
#[derive(Clone)]
pub struct FirmwareOps {
    fw: Arc<dyn FirmwareCall>,
    mtcmos: u32,
}

impl FirmwareOps {
    /// Ops for MTCMOS island `mtcmos`
    pub fn new(fw: Arc<dyn FirmwareCall>, mtcmos: u32) -> Self {
        Self { fw, mtcmos }
    }

    /// Same transport, different island
    pub fn with_mtcmos(&self, mtcmos: u32) -> Self {
        Self {
            fw: Arc::clone(&self.fw),
            mtcmos,
        }
    }

    /// MTCMOS island id
    pub const fn mtcmos(&self) -> u32 {
        self.mtcmos
    }

    /// Ask firmware whether it controls this island
    pub fn is_supported(&self) -> bool {
        mtcmos_supported(self.fw.as_ref(), self.mtcmos)
    }

    fn check(ret: i64) -> PdResult<()> {
        if ret == SMCCC_RET_SUCCESS {
            Ok(())
        } else {
            Err(PdError::TransportFailure(ret))
        }
    }
}

impl CpuPdOps for FirmwareOps {
    fn power_on(&self) -> PdResult<()> {
        let ret = mtk_sip_simple_call(self.fw.as_ref(), MTK_SIP_PWR_ON_MTCMOS, self.mtcmos as u64, 0, 0);
        Self::check(ret)
    }

    fn power_off(&self, state_idx: usize, param: u32, _cpus: &CpuMask) -> PdResult<()> {
        let ret = mtk_sip_simple_call(
            self.fw.as_ref(),
            MTK_SIP_PWR_OFF_MTCMOS,
            self.mtcmos as u64,
            state_idx as u64,
            param as u64,
        );
        Self::check(ret)
    }
}

impl fmt::Debug for FirmwareOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirmwareOps")
            .field("mtcmos", &self.mtcmos)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CAPABILITY
// =============================================================================

/// Power operations attached to a domain
#[derive(Clone, Default)]
pub enum PowerOps {
    /// No callbacks, transitions always succeed
    #[default]
    Noop,
    /// SoC firmware calls
    Firmware(FirmwareOps),
    /// Platform-provided callbacks
    Custom(Arc<dyn CpuPdOps>),
}

impl PowerOps {
    /// Check for the no-op capability
    pub const fn is_noop(&self) -> bool {
        matches!(self, PowerOps::Noop)
    }

    /// Power the domain up
    pub fn power_on(&self) -> PdResult<()> {
        match self {
            PowerOps::Noop => Ok(()),
            PowerOps::Firmware(ops) => ops.power_on(),
            PowerOps::Custom(ops) => ops.power_on(),
        }
    }

    /// Power the domain down
    pub fn power_off(&self, state_idx: usize, param: u32, cpus: &CpuMask) -> PdResult<()> {
        match self {
            PowerOps::Noop => Ok(()),
            PowerOps::Firmware(ops) => ops.power_off(state_idx, param, cpus),
            PowerOps::Custom(ops) => ops.power_off(state_idx, param, cpus),
        }
    }
}

impl fmt::Debug for PowerOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerOps::Noop => f.write_str("Noop"),
            PowerOps::Firmware(ops) => f.debug_tuple("Firmware").field(ops).finish(),
            PowerOps::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::vec::Vec;

    use helix_hal::{SmcccConduit, SmcccTransport};

    use super::*;

    #[derive(Default)]
    struct RecordingFirmware {
        calls: Mutex<Vec<(u32, u64, u64, u64)>>,
        ret: i64,
    }

    impl FirmwareCall for RecordingFirmware {
        fn call(&self, func_id: u32, a1: u64, a2: u64, a3: u64) -> i64 {
            self.calls.lock().unwrap().push((func_id, a1, a2, a3));
            self.ret
        }
    }

    #[test]
    fn test_firmware_ops_arguments() {
        let fw = Arc::new(RecordingFirmware::default());
        let ops = PowerOps::Firmware(FirmwareOps::new(fw.clone(), 3));

        ops.power_off(2, 0x10, &CpuMask::first(4)).unwrap();
        ops.power_on().unwrap();

        let calls = fw.calls.lock().unwrap();
        assert_eq!(calls[0], (MTK_SIP_PWR_OFF_MTCMOS, 3, 2, 0x10));
        assert_eq!(calls[1], (MTK_SIP_PWR_ON_MTCMOS, 3, 0, 0));
    }

    #[test]
    fn test_firmware_error_is_unmodified() {
        let fw = Arc::new(RecordingFirmware {
            ret: -3,
            ..Default::default()
        });
        let ops = FirmwareOps::new(fw.clone(), 1);
        assert_eq!(ops.power_on(), Err(PdError::TransportFailure(-3)));
        assert_eq!(fw.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_no_conduit_not_supported() {
        let ops = FirmwareOps::new(Arc::new(SmcccTransport::new(SmcccConduit::None)), 0);
        assert!(!ops.is_supported());
        assert_eq!(ops.power_on(), Err(PdError::TransportFailure(-1)));
        assert_eq!(ops.with_mtcmos(5).mtcmos(), 5);
    }

    #[test]
    fn test_noop() {
        let ops = PowerOps::default();
        assert!(ops.is_noop());
        assert_eq!(ops.power_off(7, 0, &CpuMask::new()), Ok(()));
        assert_eq!(ops.power_on(), Ok(()));
    }
}
