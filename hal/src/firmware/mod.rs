//! # Firmware Call Transport
//!
//! Synchronous SMC Calling Convention (SMCCC) requests to secure firmware or
//! a hypervisor. A call takes a function id and up to three arguments and
//! returns a signed result code in `x0`. Each call is a single atomic
//! request/response exchange: no retry, no allocation, safe from
//! interrupt-disabled context.

pub mod mtk_sip;
mod smccc;

// =============================================================================
// SMCCC RETURN VALUES
// =============================================================================

/// Success
pub const SMCCC_RET_SUCCESS: i64 = 0;
/// Function not supported (also returned when no conduit is available)
pub const SMCCC_RET_NOT_SUPPORTED: i64 = -1;
/// Invalid parameters
pub const SMCCC_RET_INVALID_PARAMS: i64 = -2;
/// Denied
pub const SMCCC_RET_DENIED: i64 = -3;

// =============================================================================
// TRANSPORT
// =============================================================================

/// A synchronous firmware call primitive supplied by the platform layer
pub trait FirmwareCall: Send + Sync {
    /// Issue `func_id` with three arguments and return the firmware's result code
    fn call(&self, func_id: u32, a1: u64, a2: u64, a3: u64) -> i64;
}

/// SMCCC calling convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmcccConduit {
    /// Not detected
    None,
    /// SMC (Secure Monitor Call)
    Smc,
    /// HVC (Hypervisor Call)
    Hvc,
}

impl SmcccConduit {
    /// Parse the firmware description's `method` property
    pub fn from_method(method: &str) -> Self {
        match method {
            "smc" => SmcccConduit::Smc,
            "hvc" => SmcccConduit::Hvc,
            _ => SmcccConduit::None,
        }
    }
}

/// Firmware transport over an SMCCC conduit
#[derive(Debug, Clone, Copy)]
pub struct SmcccTransport {
    conduit: SmcccConduit,
}

impl SmcccTransport {
    /// Create a transport using `conduit`
    pub const fn new(conduit: SmcccConduit) -> Self {
        Self { conduit }
    }

    /// Conduit in use
    pub const fn conduit(&self) -> SmcccConduit {
        self.conduit
    }
}

impl FirmwareCall for SmcccTransport {
    #[inline]
    fn call(&self, func_id: u32, a1: u64, a2: u64, a3: u64) -> i64 {
        match self.conduit {
            // SAFETY: SMCCC calls only clobber x0-x7, which the asm declares.
            SmcccConduit::Smc => unsafe { smccc::smc_call(func_id, a1, a2, a3) },
            // SAFETY: as above, for the hypervisor conduit.
            SmcccConduit::Hvc => unsafe { smccc::hvc_call(func_id, a1, a2, a3) },
            SmcccConduit::None => SMCCC_RET_NOT_SUPPORTED,
        }
    }
}
