//! # CPU Idle Controller
//!
//! Drives the domain hierarchy from the per-CPU idle and hotplug paths.
//!
//! ## Idle entry
//!
//! ```text
//!   cpu_idle_enter(cpu)
//!     leaf ──► parent ──► ... ──► root        (one domain lock at a time)
//!       mark cpu idle
//!       all online members idle and all children off?
//!         Active ──► Evaluating ──► governor ──► PoweredOff / Active
//!       keep climbing only while domains power off
//! ```
//!
//! ## Idle exit
//!
//! Clears the CPU's idle bit and powers every PoweredOff domain on its
//! path back up, root first.
//!
//! Runtime failures never stop a CPU from idling or resuming: a rejected
//! transition is logged and counted and the domain stays Active.

use helix_hal::{CpuId, CpuState, Ktime};

use crate::domain::{DomainId, DomainInner, PowerDomain};
use crate::driver::{power_off_locked, power_on_locked};
use crate::error::{PdError, PdResult};
use crate::governor::{evaluate_locked, GovernorContext};
use crate::state::DomainPowerState;
use crate::tree::{DomainTree, TreeInner};

/// Highest domain powered off by one idle entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerDown {
    /// Domain nearest the root that went down
    pub domain: DomainId,
    /// State it entered
    pub state_idx: usize,
    /// Number of domains powered off on the way up
    pub levels: usize,
}

/// Runtime idle and hotplug controller
#[derive(Debug)]
pub struct CpuPowerController<'a> {
    tree: &'a DomainTree,
    ctx: GovernorContext<'a>,
}

impl<'a> CpuPowerController<'a> {
    /// Controller over `tree`
    pub fn new(tree: &'a DomainTree, ctx: GovernorContext<'a>) -> Self {
        Self { tree, ctx }
    }

    /// Domain tree
    pub fn tree(&self) -> &'a DomainTree {
        self.tree
    }

    // =========================================================================
    // Idle path
    // =========================================================================

    /// `cpu` is about to idle at `now`
    pub fn cpu_idle_enter(&self, cpu: CpuId, now: Ktime) -> Option<PowerDown> {
        if !self.ctx.topology.is_online(cpu) {
            return None;
        }
        self.ctx.topology.set_state(cpu, CpuState::Idle).ok()?;

        let tree = self.tree.read();
        let home = tree.home(cpu)?;

        let mut outcome = None;
        let mut levels = 0;
        let mut climbing = true;

        for pd in tree.chain(home) {
            let mut inner = pd.lock();
            if !inner.cpus.contains(cpu) {
                break;
            }
            inner.idle.set(cpu);

            if !climbing {
                continue;
            }
            if !self.all_online_idle(pd, &inner) {
                climbing = false;
                continue;
            }

            // Children are checked unlocked, after our idle bit is in. The
            // last CPU to set its bit here sees every sibling's final state.
            if !tree.children(pd.id()).is_empty() {
                drop(inner);
                if !self.children_powered_off(&tree, pd) {
                    climbing = false;
                    continue;
                }
                inner = pd.lock();
                if !self.all_online_idle(pd, &inner) {
                    climbing = false;
                    continue;
                }
            }

            match self.power_down(pd, &mut inner, now) {
                Some(state_idx) => {
                    levels += 1;
                    outcome = Some(PowerDown {
                        domain: pd.id(),
                        state_idx,
                        levels,
                    });
                },
                None => climbing = false,
            }
        }

        outcome
    }

    /// `cpu` resumed from idle. Returns the number of domains powered on.
    pub fn cpu_idle_exit(&self, cpu: CpuId) -> usize {
        if self.ctx.topology.state(cpu) == CpuState::Idle {
            let _ = self.ctx.topology.set_state(cpu, CpuState::Online);
        }

        let tree = self.tree.read();
        match tree.home(cpu).and_then(|home| tree.get(home)) {
            Some(pd) => wake_from_root(&tree, pd, cpu),
            None => 0,
        }
    }

    /// Every child of `pd` is powered off or has no online CPU. Takes and
    /// drops each child's lock in turn; `pd` must not be locked.
    fn children_powered_off(&self, tree: &TreeInner, pd: &PowerDomain) -> bool {
        tree.children(pd.id())
            .iter()
            .filter_map(|&child| tree.get(child))
            .all(|child| {
                child.power_state() == DomainPowerState::PoweredOff
                    || !child
                        .members()
                        .iter()
                        .any(|cpu| self.ctx.topology.is_online(cpu))
            })
    }

    fn all_online_idle(&self, pd: &PowerDomain, inner: &DomainInner) -> bool {
        pd.power_state() == DomainPowerState::Active
            && inner
                .cpus
                .iter()
                .filter(|&cpu| self.ctx.topology.is_online(cpu))
                .all(|cpu| inner.idle.contains(cpu))
    }

    /// Active ──► Evaluating ──► PoweredOff / Active, under the domain lock
    fn power_down(&self, pd: &PowerDomain, inner: &mut DomainInner, now: Ktime) -> Option<usize> {
        pd.set_power_state(inner, DomainPowerState::Evaluating);

        let Some(state_idx) = evaluate_locked(pd, inner, now, &self.ctx) else {
            pd.set_power_state(inner, DomainPowerState::Active);
            return None;
        };

        match power_off_locked(pd, inner, state_idx) {
            Ok(()) => {
                inner.stats.power_off += 1;
                if let Some(usage) = inner.stats.usage.get_mut(state_idx) {
                    *usage += 1;
                }
                pd.set_power_state(inner, DomainPowerState::PoweredOff);
                Some(state_idx)
            },
            Err(_) => {
                inner.stats.transport_failures += 1;
                pd.set_power_state(inner, DomainPowerState::Active);
                None
            },
        }
    }

    // =========================================================================
    // Hotplug
    // =========================================================================

    /// Bring `cpu` back under power management
    pub fn cpu_online(&self, cpu: CpuId) -> PdResult<()> {
        let home = self.tree.home_domain(cpu).ok_or(PdError::DeviceNotFound)?;
        self.ctx
            .topology
            .set_state(cpu, CpuState::Starting)
            .map_err(|_| PdError::DeviceNotFound)?;

        let attached = self
            .tree
            .members(home)
            .map_or(false, |cpus| cpus.contains(cpu));
        if !attached {
            self.tree.attach_cpu(home, cpu)?;
        }

        let _ = self.ctx.topology.set_state(cpu, CpuState::Online);
        let woken = self.cpu_idle_exit(cpu);

        log::info!("CPU PD: CPU{} online ({} domains powered on)", cpu, woken);
        Ok(())
    }

    /// Take `cpu` out of power management. Waits for any evaluation of
    /// its domains in progress.
    pub fn cpu_offline(&self, cpu: CpuId) -> PdResult<()> {
        let home = self.tree.home_domain(cpu).ok_or(PdError::DeviceNotFound)?;
        let prev = self
            .ctx
            .topology
            .set_state(cpu, CpuState::Stopping)
            .map_err(|_| PdError::DeviceNotFound)?;

        if let Err(err) = self.tree.detach_cpu(home, cpu) {
            let _ = self.ctx.topology.set_state(cpu, prev);
            return Err(err);
        }

        let _ = self.ctx.topology.set_state(cpu, CpuState::Offline);
        log::info!("CPU PD: CPU{} offline", cpu);
        Ok(())
    }
}

/// Clear `cpu`'s idle bit and power domains back on, root first
fn wake_from_root(tree: &TreeInner, pd: &PowerDomain, cpu: CpuId) -> usize {
    let mut woken = pd
        .parent()
        .and_then(|parent| tree.get(parent))
        .map_or(0, |parent| wake_from_root(tree, parent, cpu));

    let mut inner = pd.lock();
    inner.idle.clear(cpu);

    if pd.power_state() == DomainPowerState::PoweredOff {
        match power_on_locked(pd, &inner) {
            Ok(()) => {
                inner.stats.power_on += 1;
                woken += 1;
            },
            Err(_) => inner.stats.transport_failures += 1,
        }
        pd.set_power_state(&inner, DomainPowerState::Active);
    }

    woken
}
