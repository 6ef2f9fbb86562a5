//! # MediaTek SiP Services
//!
//! Silicon-provider calls used to switch MTCMOS power islands (the CPU
//! cluster power domains on MT8173/MT6797 class SoCs).

use super::{FirmwareCall, SMCCC_RET_SUCCESS};

/// Power on an MTCMOS domain
pub const MTK_SIP_PWR_ON_MTCMOS: u32 = 0x8200_0402;
/// Power off an MTCMOS domain
pub const MTK_SIP_PWR_OFF_MTCMOS: u32 = 0x8200_0403;
/// Query whether firmware controls an MTCMOS domain
pub const MTK_SIP_PWR_MTCMOS_SUPPORT: u32 = 0x8200_0404;

/// Issue a SiP call and return the raw result
#[inline]
pub fn mtk_sip_simple_call(fw: &dyn FirmwareCall, func_id: u32, a1: u64, a2: u64, a3: u64) -> i64 {
    fw.call(func_id, a1, a2, a3)
}

/// Check if firmware manages the MTCMOS island `domain`
pub fn mtcmos_supported(fw: &dyn FirmwareCall, domain: u32) -> bool {
    let ret = mtk_sip_simple_call(fw, MTK_SIP_PWR_MTCMOS_SUPPORT, domain as u64, 0, 0);
    if ret != SMCCC_RET_SUCCESS {
        log::debug!("MTK SiP: MTCMOS {} not firmware-managed ({})", domain, ret);
    }
    ret == SMCCC_RET_SUCCESS
}
