//! # CPU Power Domain Errors

use core::fmt;

/// CPU power-domain error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdError {
    /// Domain node is disabled or missing
    NotAvailable,
    /// The CPU (or its device) could not be resolved
    DeviceNotFound,
    /// Firmware rejected a power transition with this code
    TransportFailure(i64),
    /// The domain hierarchy could not be built
    TreeConstructionFailure(&'static str),
}

impl fmt::Display for PdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdError::NotAvailable => write!(f, "power domain not available"),
            PdError::DeviceNotFound => write!(f, "CPU device not found"),
            PdError::TransportFailure(code) => write!(f, "firmware call failed: {}", code),
            PdError::TreeConstructionFailure(why) => write!(f, "domain tree construction failed: {}", why),
        }
    }
}

/// Result type for CPU power-domain operations
pub type PdResult<T> = Result<T, PdError>;
