//! # Boot-Time Domain Setup
//!
//! Builds the domain tree from the firmware description, one CPU at a
//! time. For each CPU the domain its `power-domains` entry names is looked
//! up or created, its parents are created and linked recursively, and the
//! CPU is attached.
//!
//! ```text
//!   cpu ──► cpu_domain(cpu) ──► get_or_create(node)
//!                                  ├── found by identity ─► done
//!                                  └── create ─► get_or_create(parent)
//!                                                 ├── ok   ─► link
//!                                                 └── fail ─► stay a root
//! ```

use helix_hal::CpuId;

use crate::domain::DomainId;
use crate::error::{PdError, PdResult};
use crate::ops::PowerOps;
use crate::platform::{FirmwareDescription, FwNode};
use crate::tree::DomainTree;

/// Create the domain for `node` from its firmware description
fn init_domain<F>(tree: &DomainTree, fw: &F, node: FwNode, ops: &PowerOps) -> PdResult<DomainId>
where
    F: FirmwareDescription + ?Sized,
{
    if !fw.is_available(node) {
        return Err(PdError::NotAvailable);
    }

    let ops = match (ops, fw.mtcmos_id(node)) {
        (PowerOps::Firmware(fw_ops), Some(mtcmos)) => PowerOps::Firmware(fw_ops.with_mtcmos(mtcmos)),
        (ops, _) => ops.clone(),
    };

    let id = tree
        .create_domain(fw.name(node), ops, fw.idle_states(node))
        .map_err(|err| {
            log::error!("CPU PD: unable to initialize domain {}: {}", fw.name(node), err);
            err
        })?;
    tree.register_identity(node, id)?;
    Ok(id)
}

/// Domain for `node`, creating it and its ancestors on first use
fn get_or_create<F>(tree: &DomainTree, fw: &F, node: FwNode, ops: &PowerOps) -> PdResult<DomainId>
where
    F: FirmwareDescription + ?Sized,
{
    if let Some(id) = tree.find_domain_by_identity(node) {
        return Ok(id);
    }

    let id = init_domain(tree, fw, node, ops)?;

    let Some(parent_node) = fw.parent(node) else {
        return Ok(id);
    };

    match get_or_create(tree, fw, parent_node, ops) {
        Ok(parent) => tree.attach_child(parent, id).map_err(|err| {
            log::error!("CPU PD: unable to add sub-domain {}: {}", fw.name(node), err);
            err
        })?,
        Err(err) => log::warn!("CPU PD: {} left without parent: {}", fw.name(node), err),
    }

    Ok(id)
}

/// Set up the power domains of one CPU and attach it.
///
/// Calling this again for an attached CPU is a no-op returning the same
/// domain.
pub fn setup_cpu<F>(tree: &DomainTree, fw: &F, cpu: CpuId, ops: &PowerOps) -> PdResult<DomainId>
where
    F: FirmwareDescription + ?Sized,
{
    let node = fw.cpu_domain(cpu).ok_or(PdError::DeviceNotFound)?;

    if !fw.cpu_device_present(cpu) {
        log::warn!("CPU PD: unable to get device for CPU{}", cpu);
        return Err(PdError::DeviceNotFound);
    }

    let domain = get_or_create(tree, fw, node, ops)?;

    let attached = tree
        .members(domain)
        .map_or(false, |cpus| cpus.contains(cpu));
    if !attached {
        tree.attach_cpu(domain, cpu)?;
    }

    Ok(domain)
}

/// Set up every possible CPU. Stops at the first CPU that fails.
pub fn setup_all_cpus<F>(tree: &DomainTree, fw: &F, ops: &PowerOps) -> PdResult<()>
where
    F: FirmwareDescription + ?Sized,
{
    let cpus = fw.possible_cpus();

    for cpu in cpus.iter() {
        setup_cpu(tree, fw, cpu, ops).map_err(|err| {
            log::error!("CPU PD: setup failed at CPU{}: {}", cpu, err);
            err
        })?;
    }

    log::info!("CPU PD: {} domains for CPUs {}", tree.len(), cpus);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::vec::Vec;

    use helix_hal::{CpuMask, FirmwareCall};

    use super::*;
    use crate::ops::FirmwareOps;
    use crate::state::IdleState;

    struct Node {
        name: &'static str,
        available: bool,
        parent: Option<FwNode>,
        states: Vec<IdleState>,
        mtcmos: Option<u32>,
    }

    #[derive(Default)]
    struct FakeDt {
        nodes: HashMap<FwNode, Node>,
        cpus: HashMap<CpuId, (Option<FwNode>, bool)>,
    }

    impl FakeDt {
        fn node(mut self, id: FwNode, name: &'static str, parent: Option<FwNode>) -> Self {
            self.nodes.insert(
                id,
                Node {
                    name,
                    available: true,
                    parent,
                    states: std::vec![IdleState::from_us(10, 20, 100)],
                    mtcmos: None,
                },
            );
            self
        }

        fn cpu(mut self, cpu: CpuId, domain: Option<FwNode>, device: bool) -> Self {
            self.cpus.insert(cpu, (domain, device));
            self
        }

        fn disable(mut self, id: FwNode) -> Self {
            if let Some(n) = self.nodes.get_mut(&id) {
                n.available = false;
            }
            self
        }

        /// system(1) ─┬─ cluster0(10) ── CPU 0,1
        ///            └─ cluster1(11) ── CPU 2,3
        fn big_little() -> Self {
            Self::default()
                .node(1, "/cpus/domain-idle/system", None)
                .node(10, "/cpus/domain-idle/cluster0", Some(1))
                .node(11, "/cpus/domain-idle/cluster1", Some(1))
                .cpu(0, Some(10), true)
                .cpu(1, Some(10), true)
                .cpu(2, Some(11), true)
                .cpu(3, Some(11), true)
        }
    }

    impl FirmwareDescription for FakeDt {
        fn is_available(&self, node: FwNode) -> bool {
            self.nodes.get(&node).map_or(false, |n| n.available)
        }

        fn name(&self, node: FwNode) -> &str {
            self.nodes.get(&node).map_or("", |n| n.name)
        }

        fn parent(&self, node: FwNode) -> Option<FwNode> {
            self.nodes.get(&node).and_then(|n| n.parent)
        }

        fn idle_states(&self, node: FwNode) -> &[IdleState] {
            self.nodes
                .get(&node)
                .map(|n| n.states.as_slice())
                .unwrap_or(&[])
        }

        fn cpu_domain(&self, cpu: CpuId) -> Option<FwNode> {
            self.cpus.get(&cpu).and_then(|c| c.0)
        }

        fn cpu_device_present(&self, cpu: CpuId) -> bool {
            self.cpus.get(&cpu).map_or(false, |c| c.1)
        }

        fn possible_cpus(&self) -> CpuMask {
            self.cpus.keys().copied().collect()
        }

        fn mtcmos_id(&self, node: FwNode) -> Option<u32> {
            self.nodes.get(&node).and_then(|n| n.mtcmos)
        }
    }

    #[test]
    fn test_setup_all_builds_hierarchy() {
        let fw = FakeDt::big_little();
        let tree = DomainTree::new();
        setup_all_cpus(&tree, &fw, &PowerOps::Noop).unwrap();

        assert_eq!(tree.len(), 3);
        let system = tree.find_domain_by_identity(1).unwrap();
        let cluster0 = tree.find_domain_by_identity(10).unwrap();
        let cluster1 = tree.find_domain_by_identity(11).unwrap();

        assert_eq!(tree.parent(cluster0), Some(system));
        assert_eq!(tree.parent(cluster1), Some(system));
        assert_eq!(tree.members(cluster0), Some(CpuMask::first(2)));
        assert_eq!(tree.members(cluster1), Some([2u32, 3].into_iter().collect::<CpuMask>()));
        assert_eq!(tree.members(system), Some(CpuMask::first(4)));
        assert_eq!(tree.home_domain(3), Some(cluster1));
        assert_eq!(tree.domain(system).unwrap().name(), "/cpus/domain-idle/system");
    }

    #[test]
    fn test_setup_is_idempotent() {
        let fw = FakeDt::big_little();
        let tree = DomainTree::new();
        let first = setup_cpu(&tree, &fw, 0, &PowerOps::Noop).unwrap();
        let again = setup_cpu(&tree, &fw, 0, &PowerOps::Noop).unwrap();
        assert_eq!(first, again);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.members(first), Some(CpuMask::single(0)));
    }

    #[test]
    fn test_disabled_domain() {
        let fw = FakeDt::big_little().disable(10);
        let tree = DomainTree::new();
        assert_eq!(setup_cpu(&tree, &fw, 0, &PowerOps::Noop), Err(PdError::NotAvailable));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_disabled_parent_is_skipped() {
        let fw = FakeDt::big_little().disable(1);
        let tree = DomainTree::new();
        let cluster0 = setup_cpu(&tree, &fw, 0, &PowerOps::Noop).unwrap();
        assert_eq!(tree.parent(cluster0), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_missing_cpu_device_leaves_tree_unchanged() {
        let fw = FakeDt::big_little().cpu(4, Some(11), false).cpu(5, None, true);
        let tree = DomainTree::new();
        assert_eq!(setup_cpu(&tree, &fw, 4, &PowerOps::Noop), Err(PdError::DeviceNotFound));
        assert_eq!(setup_cpu(&tree, &fw, 5, &PowerOps::Noop), Err(PdError::DeviceNotFound));
        assert_eq!(setup_cpu(&tree, &fw, 9, &PowerOps::Noop), Err(PdError::DeviceNotFound));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_setup_all_stops_at_first_failure() {
        let fw = FakeDt::big_little().cpu(1, Some(10), false);
        let tree = DomainTree::new();
        assert_eq!(setup_all_cpus(&tree, &fw, &PowerOps::Noop), Err(PdError::DeviceNotFound));

        let cluster0 = tree.find_domain_by_identity(10).unwrap();
        assert_eq!(tree.members(cluster0), Some(CpuMask::single(0)));
        assert_eq!(tree.home_domain(2), None);
        assert_eq!(tree.find_domain_by_identity(11), None);
    }

    #[test]
    fn test_cyclic_description_fails() {
        let fw = FakeDt::default()
            .node(20, "a", Some(21))
            .node(21, "b", Some(20))
            .cpu(0, Some(20), true);
        let tree = DomainTree::new();
        assert!(matches!(
            setup_cpu(&tree, &fw, 0, &PowerOps::Noop),
            Err(PdError::TreeConstructionFailure(_))
        ));
    }

    struct NullFirmware;

    impl FirmwareCall for NullFirmware {
        fn call(&self, _func_id: u32, _a1: u64, _a2: u64, _a3: u64) -> i64 {
            0
        }
    }

    #[test]
    fn test_firmware_ops_get_per_node_island() {
        let mut fw = FakeDt::big_little();
        if let Some(n) = fw.nodes.get_mut(&11) {
            n.mtcmos = Some(7);
        }
        let tree = DomainTree::new();
        let ops = PowerOps::Firmware(FirmwareOps::new(Arc::new(NullFirmware), 0));
        let cluster1 = setup_cpu(&tree, &fw, 2, &ops).unwrap();

        match tree.domain(cluster1).unwrap().ops() {
            PowerOps::Firmware(f) => assert_eq!(f.mtcmos(), 7),
            other => panic!("unexpected ops {:?}", other),
        }
        let system = tree.parent(cluster1).unwrap();
        match tree.domain(system).unwrap().ops() {
            PowerOps::Firmware(f) => assert_eq!(f.mtcmos(), 0),
            other => panic!("unexpected ops {:?}", other),
        }
    }
}
