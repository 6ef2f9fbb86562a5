//! # Idle-State Governor
//!
//! Decides how deep a domain may go when its last running member is about
//! to idle.
//!
//! The idle-state table is scanned deepest first. A state whose
//! break-even time exceeds the available sleep is skipped. The first state
//! that fits the sleep window is the only candidate: it is selected if its
//! break-even time is at least the QoS latency, otherwise the scan stops
//! and the domain stays up. Shallower states are never reconsidered once a
//! deeper one that fits has failed the latency check.
//!
//! ```text
//!   deepest ──► [N-1] be > avail?  skip
//!               [N-2] be > avail?  skip
//!               [k]   fits ──► be >= qos ? Some(k) : None
//! ```

use helix_hal::time::NSEC_PER_USEC;
use helix_hal::{CpuTopology, Ktime};

use crate::domain::{DomainInner, PowerDomain};
use crate::platform::{LatencyQos, WakeupSource};
use crate::state::IdleState;

/// Collaborators consulted by every evaluation
#[derive(Clone, Copy)]
pub struct GovernorContext<'a> {
    /// Latency QoS constraint
    pub qos: &'a dyn LatencyQos,
    /// Per-CPU wakeup deadlines
    pub wakeups: &'a dyn WakeupSource,
    /// Online state of CPUs
    pub topology: &'a CpuTopology,
}

impl<'a> GovernorContext<'a> {
    /// Bundle the collaborators
    pub fn new(qos: &'a dyn LatencyQos, wakeups: &'a dyn WakeupSource, topology: &'a CpuTopology) -> Self {
        Self {
            qos,
            wakeups,
            topology,
        }
    }
}

impl core::fmt::Debug for GovernorContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GovernorContext")
            .field("qos_us", &self.qos.max_latency_us())
            .field("topology", self.topology)
            .finish_non_exhaustive()
    }
}

/// Pick an idle state for a sleep window of `available` with a latency
/// constraint of `qos_us` microseconds
pub fn select_state(states: &[IdleState], available: Ktime, qos_us: u32) -> Option<usize> {
    if qos_us == 0 || available <= Ktime::ZERO {
        return None;
    }

    let available_ns = available.as_ns() as u64;
    let qos_ns = qos_us as u64 * NSEC_PER_USEC as u64;

    for (idx, state) in states.iter().enumerate().rev() {
        let break_even = state.break_even_ns();
        if break_even > available_ns {
            continue;
        }
        if break_even < qos_ns {
            return None;
        }
        return Some(idx);
    }

    None
}

/// Earliest wakeup among the online CPUs of `inner`, or `None` if no
/// member is online
fn earliest_wakeup(inner: &DomainInner, ctx: &GovernorContext<'_>) -> Option<Ktime> {
    inner
        .cpus
        .iter()
        .filter(|&cpu| ctx.topology.is_online(cpu))
        .map(|cpu| ctx.wakeups.next_wakeup(cpu))
        .min()
}

/// Evaluate a domain whose inner lock is already held
pub(crate) fn evaluate_locked(
    domain: &PowerDomain,
    inner: &mut DomainInner,
    now: Ktime,
    ctx: &GovernorContext<'_>,
) -> Option<usize> {
    let earliest = earliest_wakeup(inner, ctx)?;

    inner.state_idx = 0;
    inner.stats.evaluations += 1;

    let qos_us = ctx.qos.max_latency_us();
    let available = earliest - now;
    let selected = select_state(domain.idle_states(), available, qos_us);

    match selected {
        Some(idx) => inner.state_idx = idx,
        None => inner.stats.rejected += 1,
    }

    if cfg!(feature = "debug") {
        log::trace!(
            "CPU PD: {} sleep {} qos {}us -> {:?}",
            domain.name(),
            available,
            qos_us,
            selected
        );
    }

    selected
}

/// Decide the idle state of `domain` at time `now`.
///
/// Returns `None` (stay up) when QoS forbids power-down, the sleep window
/// is empty, no state fits or the domain has no online member. The last
/// case leaves the domain untouched.
pub fn evaluate_down(domain: &PowerDomain, now: Ktime, ctx: &GovernorContext<'_>) -> Option<usize> {
    let mut inner = domain.lock();
    evaluate_locked(domain, &mut inner, now, ctx)
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use helix_hal::{CpuId, CpuState, Mpidr};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::domain::DomainId;
    use crate::ops::PowerOps;
    use crate::platform::PmQos;
    use crate::state::idle_state_table;

    fn us(v: i64) -> Ktime {
        Ktime::from_us(v)
    }

    fn table() -> [IdleState; 2] {
        [IdleState::from_us(1, 1, 2), IdleState::from_us(3, 3, 10)]
    }

    #[test]
    fn test_qos_stricter_than_any_break_even() {
        // state 1: 16us fits in 30us but is below 50us; the scan stops there
        assert_eq!(select_state(&table(), us(30), 50), None);
    }

    #[test]
    fn test_deepest_admissible_state() {
        assert_eq!(select_state(&table(), us(30), 5), Some(1));
    }

    #[test]
    fn test_shallow_state_when_deep_does_not_fit() {
        // 16us does not fit into 10us, 4us does and is above 3us
        assert_eq!(select_state(&table(), us(10), 3), Some(0));
        assert_eq!(select_state(&table(), us(10), 5), None);
    }

    #[test]
    fn test_exact_ties_are_admissible() {
        assert_eq!(select_state(&table(), us(16), 16), Some(1));
        assert_eq!(select_state(&table(), us(4), 4), Some(0));
        assert_eq!(select_state(&table(), Ktime::from_ns(15_999), 4), Some(0));
    }

    #[test]
    fn test_zero_qos_and_empty_window() {
        assert_eq!(select_state(&table(), us(1_000), 0), None);
        assert_eq!(select_state(&table(), Ktime::ZERO, 1), None);
        assert_eq!(select_state(&table(), us(-5), 1), None);
        assert_eq!(select_state(&[], us(1_000), 1), None);
    }

    #[test]
    fn test_never_wakes() {
        assert_eq!(select_state(&table(), Ktime::MAX, 1), Some(1));
    }

    /// Deepest index that fits the window and meets the latency bound while
    /// every deeper index misses the window
    fn reference(states: &[IdleState], available: Ktime, qos_us: u32) -> Option<usize> {
        let fits = |i: usize| i128::from(states[i].break_even_ns()) <= i128::from(available.as_ns());
        let meets_qos = |i: usize| states[i].break_even_ns() >= u64::from(qos_us) * 1_000;

        (0..states.len())
            .filter(|_| qos_us > 0 && available > Ktime::ZERO)
            .filter(|&i| fits(i) && meets_qos(i))
            .filter(|&i| (i + 1..states.len()).all(|j| !fits(j)))
            .max()
    }

    fn check(states: &[IdleState], available: Ktime, qos_us: u32) {
        let got = select_state(states, available, qos_us);
        assert_eq!(got, reference(states, available, qos_us));

        if let Some(idx) = got {
            let be = states[idx].break_even_ns();
            assert!(be <= available.as_ns() as u64);
            assert!(be >= qos_us as u64 * 1_000);
            assert!(states[idx + 1..]
                .iter()
                .all(|s| s.break_even_ns() > available.as_ns() as u64));
        }
        if qos_us == 0 || available <= Ktime::ZERO {
            assert_eq!(got, None);
        }
    }

    #[test]
    fn test_exhaustive_small_tables() {
        let values = [0u64, 1, 2, 4, 7];
        for &a in &values {
            for &b in &values {
                for &c in &values {
                    let states = [
                        IdleState::from_us(a, 0, 1),
                        IdleState::from_us(0, b, 3),
                        IdleState::from_us(c, c, 5),
                    ];
                    for avail in -1..=20 {
                        for qos in 0..=20 {
                            check(&states, us(avail), qos);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_random_tables() {
        let mut rng = SmallRng::seed_from_u64(0x5eed_cafe);
        for _ in 0..2_000 {
            let n = rng.gen_range(0..=8);
            let states: Vec<IdleState> = (0..n)
                .map(|_| {
                    IdleState::new(
                        rng.gen_range(0..50_000),
                        rng.gen_range(0..50_000),
                        rng.gen_range(0..500_000),
                    )
                })
                .collect();
            let avail = Ktime::from_ns(rng.gen_range(-1_000..1_200_000));
            let qos = rng.gen_range(0..1_000);
            check(&states, avail, qos);
        }
    }

    // =========================================================================
    // Domain-level evaluation
    // =========================================================================

    struct FixedWakeups(Vec<Ktime>);

    impl WakeupSource for FixedWakeups {
        fn next_wakeup(&self, cpu: CpuId) -> Ktime {
            self.0.get(cpu as usize).copied().unwrap_or(Ktime::MAX)
        }
    }

    fn domain_with(cpus: &[CpuId]) -> PowerDomain {
        let pd = PowerDomain::new(
            DomainId::from_index(0),
            "cluster0",
            PowerOps::Noop,
            idle_state_table(&table()).unwrap(),
        );
        {
            let mut inner = pd.lock();
            for &cpu in cpus {
                inner.cpus.set(cpu);
            }
        }
        pd
    }

    fn topology(online: &[CpuId]) -> CpuTopology {
        let topo = CpuTopology::new();
        for cpu in 0..4 {
            topo.register_cpu(cpu, Mpidr::from_affinity(0, 0, 0, cpu as u8)).unwrap();
        }
        for &cpu in online {
            topo.set_state(cpu, CpuState::Online).unwrap();
        }
        topo
    }

    #[test]
    fn test_evaluate_uses_earliest_online_wakeup() {
        let topo = topology(&[0, 1]);
        let qos = PmQos::with_latency(5);
        // CPU 2 would wake first but is offline
        let wakeups = FixedWakeups(std::vec![us(130), us(140), us(101)]);
        let ctx = GovernorContext::new(&qos, &wakeups, &topo);
        let pd = domain_with(&[0, 1, 2]);

        assert_eq!(evaluate_down(&pd, us(100), &ctx), Some(1));
        assert_eq!(pd.state_idx(), 1);

        // 10us left: only state 0 fits, and it is below 5us
        assert_eq!(evaluate_down(&pd, us(120), &ctx), None);
        assert_eq!(pd.state_idx(), 0);

        let stats = pd.stats();
        assert_eq!(stats.evaluations, 2);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn test_evaluate_zero_qos() {
        let topo = topology(&[0]);
        let qos = PmQos::with_latency(0);
        let wakeups = FixedWakeups(std::vec![Ktime::MAX]);
        let ctx = GovernorContext::new(&qos, &wakeups, &topo);
        let pd = domain_with(&[0]);
        assert_eq!(evaluate_down(&pd, us(0), &ctx), None);
    }

    #[test]
    fn test_evaluate_without_online_members_has_no_side_effect() {
        let topo = topology(&[]);
        let qos = PmQos::with_latency(5);
        let wakeups = FixedWakeups(Vec::new());
        let ctx = GovernorContext::new(&qos, &wakeups, &topo);
        let pd = domain_with(&[0, 1]);
        pd.lock().state_idx = 1;

        assert_eq!(evaluate_down(&pd, us(0), &ctx), None);
        assert_eq!(pd.state_idx(), 1);
        assert_eq!(pd.stats().evaluations, 0);
    }
}
