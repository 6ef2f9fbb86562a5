//! # Power Transition Driver
//!
//! Runs a domain's power operations for a selected state. Firmware errors
//! are returned as-is; there is no retry at this level.

use crate::domain::{DomainInner, PowerDomain};
use crate::error::PdResult;

/// Power-off with the inner lock held. The membership passed to the ops
/// is the one frozen under that lock.
pub(crate) fn power_off_locked(domain: &PowerDomain, inner: &DomainInner, state_idx: usize) -> PdResult<()> {
    let param = domain
        .idle_states()
        .get(state_idx)
        .map_or(0, |state| state.param);

    domain.ops().power_off(state_idx, param, &inner.cpus).map_err(|err| {
        log::warn!("CPU PD: {} power-off to state {} failed: {}", domain.name(), state_idx, err);
        err
    })
}

/// Power-on with the inner lock held
pub(crate) fn power_on_locked(domain: &PowerDomain, _inner: &DomainInner) -> PdResult<()> {
    domain.ops().power_on().map_err(|err| {
        log::warn!("CPU PD: {} power-on failed: {}", domain.name(), err);
        err
    })
}

/// Power `domain` down into `state_idx`
pub fn power_off(domain: &PowerDomain, state_idx: usize) -> PdResult<()> {
    let inner = domain.lock();
    power_off_locked(domain, &inner, state_idx)
}

/// Power `domain` up
pub fn power_on(domain: &PowerDomain) -> PdResult<()> {
    let inner = domain.lock();
    power_on_locked(domain, &inner)
}
