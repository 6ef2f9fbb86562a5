//! # Domain Tree
//!
//! Registry of every CPU power domain and the links between them.
//!
//! ```text
//!                 ┌──────────┐
//!                 │  system  │   cpus 0-7
//!                 └────┬─────┘
//!           ┌──────────┴──────────┐
//!     ┌─────┴─────┐         ┌─────┴─────┐
//!     │ cluster0  │ 0-3     │ cluster1  │ 4-7
//!     └───────────┘         └───────────┘
//! ```
//!
//! Domains live in an arena and are named by [`DomainId`]. The arena, the
//! child lists and the firmware-node map sit behind one reader-writer
//! lock, taken exclusive only to create or link domains.
//!
//! CPU attach/detach runs under the shared lock. It updates each domain on
//! the path in turn under that domain's own lock, so it waits only for an
//! evaluation of a domain it touches, and that evaluation sees the CPU
//! either in the domain or not. Attach/detach calls are serialized among
//! themselves by a separate hotplug lock.

use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use helix_hal::{CpuId, CpuMask, MAX_CPUS};
use spin::{Mutex, RwLock};

use crate::domain::{bounded_name, DomainId, PowerDomain};
use crate::error::{PdError, PdResult};
use crate::ops::PowerOps;
use crate::platform::FwNode;
use crate::state::{idle_state_table, IdleState};

pub(crate) struct TreeInner {
    domains: Vec<Arc<PowerDomain>>,
    children: Vec<Vec<DomainId>>,
    by_node: HashMap<FwNode, DomainId>,
    homes: RwLock<HashMap<CpuId, DomainId>>,
}

impl TreeInner {
    pub(crate) fn get(&self, id: DomainId) -> Option<&Arc<PowerDomain>> {
        self.domains.get(id.index())
    }

    fn require(&self, id: DomainId) -> PdResult<&Arc<PowerDomain>> {
        self.get(id)
            .ok_or(PdError::TreeConstructionFailure("unknown domain"))
    }

    pub(crate) fn children(&self, id: DomainId) -> &[DomainId] {
        self.children
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn home(&self, cpu: CpuId) -> Option<DomainId> {
        self.homes.read().get(&cpu).copied()
    }

    /// `id` followed by every ancestor up to the root
    pub(crate) fn chain(&self, id: DomainId) -> impl Iterator<Item = &Arc<PowerDomain>> + '_ {
        core::iter::successors(self.get(id), move |pd| pd.parent().and_then(|p| self.get(p)))
    }
}

/// Registry of CPU power domains
pub struct DomainTree {
    inner: RwLock<TreeInner>,
    hotplug: Mutex<()>,
}

impl DomainTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TreeInner {
                domains: Vec::new(),
                children: Vec::new(),
                by_node: HashMap::new(),
                homes: RwLock::new(HashMap::new()),
            }),
            hotplug: Mutex::new(()),
        }
    }

    pub(crate) fn read(&self) -> spin::RwLockReadGuard<'_, TreeInner> {
        self.inner.read()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a domain with no members and no parent
    pub fn create_domain(&self, name: &str, ops: PowerOps, idle_states: &[IdleState]) -> PdResult<DomainId> {
        let states = idle_state_table(idle_states)?;
        let bounded = bounded_name(name);

        let mut tree = self.inner.write();
        if tree.domains.iter().any(|pd| pd.name() == bounded.as_str()) {
            return Err(PdError::TreeConstructionFailure("duplicate domain name"));
        }

        let id = DomainId::from_index(tree.domains.len());
        tree.domains
            .push(Arc::new(PowerDomain::new(id, bounded.as_str(), ops, states)));
        tree.children.push(Vec::new());

        log::debug!("CPU PD: adding {} as CPU PM domain ({})", bounded, id);
        Ok(id)
    }

    /// Bind a domain to the firmware node it was created for
    pub fn register_identity(&self, node: FwNode, id: DomainId) -> PdResult<()> {
        let mut tree = self.inner.write();
        let pd = Arc::clone(tree.require(id)?);

        if tree.by_node.contains_key(&node) {
            return Err(PdError::TreeConstructionFailure("node already has a domain"));
        }
        if !pd.set_node(node) {
            return Err(PdError::TreeConstructionFailure("domain already bound to a node"));
        }

        tree.by_node.insert(node, id);
        Ok(())
    }

    /// Link `child` beneath `parent`.
    ///
    /// A child is linked at most once. CPUs already attached to `child`
    /// are propagated to the new ancestors.
    pub fn attach_child(&self, parent: DomainId, child: DomainId) -> PdResult<()> {
        let mut tree = self.inner.write();
        let parent_pd = Arc::clone(tree.require(parent)?);
        let child_pd = Arc::clone(tree.require(child)?);

        if parent == child {
            return Err(PdError::TreeConstructionFailure("domain cannot parent itself"));
        }
        if child_pd.parent().is_some() {
            return Err(PdError::TreeConstructionFailure("domain already has a parent"));
        }
        if tree.chain(parent).any(|pd| pd.id() == child) {
            return Err(PdError::TreeConstructionFailure("link would create a cycle"));
        }
        if !child_pd.set_parent(parent) {
            return Err(PdError::TreeConstructionFailure("domain already has a parent"));
        }

        tree.children[parent.index()].push(child);

        let cpus = child_pd.members();
        if !cpus.is_empty() {
            for pd in tree.chain(parent) {
                let mut inner = pd.lock();
                inner.cpus = inner.cpus.or(&cpus);
            }
        }

        log::debug!("CPU PD: {} is a sub-domain of {}", child_pd.name(), parent_pd.name());
        Ok(())
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Add `cpu` to `domain` and every ancestor
    pub fn attach_cpu(&self, domain: DomainId, cpu: CpuId) -> PdResult<()> {
        if cpu as usize >= MAX_CPUS {
            return Err(PdError::DeviceNotFound);
        }

        let _hotplug = self.hotplug.lock();
        let tree = self.inner.read();
        tree.require(domain)?;

        for pd in tree.chain(domain) {
            pd.lock().cpus.set(cpu);
        }
        tree.homes.write().insert(cpu, domain);

        log::debug!("CPU PD: CPU{} attached to {}", cpu, domain);
        Ok(())
    }

    /// Remove `cpu` from `domain`, and from each ancestor where no other
    /// child still holds it
    pub fn detach_cpu(&self, domain: DomainId, cpu: CpuId) -> PdResult<()> {
        let _hotplug = self.hotplug.lock();
        let tree = self.inner.read();
        let pd = tree.require(domain)?;

        {
            let mut inner = pd.lock();
            if !inner.cpus.contains(cpu) {
                return Err(PdError::DeviceNotFound);
            }
            inner.cpus.clear(cpu);
            inner.idle.clear(cpu);
        }

        for ancestor in tree.chain(domain).skip(1) {
            let held = tree
                .children(ancestor.id())
                .iter()
                .filter_map(|&c| tree.get(c))
                .any(|c| c.members().contains(cpu));
            if held {
                break;
            }
            let mut inner = ancestor.lock();
            inner.cpus.clear(cpu);
            inner.idle.clear(cpu);
        }

        log::debug!("CPU PD: CPU{} detached from {}", cpu, domain);
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Domain created for firmware node `node`
    pub fn find_domain_by_identity(&self, node: FwNode) -> Option<DomainId> {
        self.inner.read().by_node.get(&node).copied()
    }

    /// Domain by name
    pub fn find_by_name(&self, name: &str) -> Option<DomainId> {
        self.inner
            .read()
            .domains
            .iter()
            .find(|pd| pd.name() == name)
            .map(|pd| pd.id())
    }

    /// Domain handle
    pub fn domain(&self, id: DomainId) -> Option<Arc<PowerDomain>> {
        self.inner.read().get(id).cloned()
    }

    /// Parent of `id`
    pub fn parent(&self, id: DomainId) -> Option<DomainId> {
        self.inner.read().get(id).and_then(|pd| pd.parent())
    }

    /// Direct children of `id`
    pub fn children(&self, id: DomainId) -> Vec<DomainId> {
        self.inner.read().children(id).to_vec()
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: DomainId) -> Vec<DomainId> {
        self.inner
            .read()
            .chain(id)
            .skip(1)
            .map(|pd| pd.id())
            .collect()
    }

    /// CPUs attached to `id`
    pub fn members(&self, id: DomainId) -> Option<CpuMask> {
        self.inner.read().get(id).map(|pd| pd.members())
    }

    /// Domain `cpu` was last attached to
    pub fn home_domain(&self, cpu: CpuId) -> Option<DomainId> {
        self.inner.read().home(cpu)
    }

    /// Number of domains
    pub fn len(&self) -> usize {
        self.inner.read().domains.len()
    }

    /// Check if the tree has no domains
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DomainTree {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for DomainTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let tree = self.inner.read();
        f.debug_list().entries(tree.domains.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    /// system ─┬─ cluster0 ─┬─ core0
    ///         │            └─ core1
    ///         └─ cluster1 ─── core2
    struct Fixture {
        tree: DomainTree,
        system: DomainId,
        cluster0: DomainId,
        cluster1: DomainId,
        core0: DomainId,
        core1: DomainId,
        core2: DomainId,
    }

    fn fixture() -> Fixture {
        let tree = DomainTree::new();
        let mk = |name| tree.create_domain(name, PowerOps::Noop, &[]).unwrap();
        let system = mk("system");
        let cluster0 = mk("cluster0");
        let cluster1 = mk("cluster1");
        let core0 = mk("core0");
        let core1 = mk("core1");
        let core2 = mk("core2");
        tree.attach_child(system, cluster0).unwrap();
        tree.attach_child(system, cluster1).unwrap();
        tree.attach_child(cluster0, core0).unwrap();
        tree.attach_child(cluster0, core1).unwrap();
        tree.attach_child(cluster1, core2).unwrap();
        Fixture {
            tree,
            system,
            cluster0,
            cluster1,
            core0,
            core1,
            core2,
        }
    }

    fn snapshot(tree: &DomainTree) -> Vec<CpuMask> {
        (0..tree.len())
            .map(|i| tree.members(DomainId::from_index(i)).unwrap())
            .collect()
    }

    #[test]
    fn test_create_domain() {
        let tree = DomainTree::new();
        assert!(tree.is_empty());
        let id = tree
            .create_domain("cluster0", PowerOps::Noop, &[IdleState::from_us(1, 1, 2)])
            .unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.find_by_name("cluster0"), Some(id));
        assert_eq!(tree.parent(id), None);
        assert!(tree.members(id).unwrap().is_empty());
        assert_eq!(tree.domain(id).unwrap().idle_states().len(), 1);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let tree = DomainTree::new();
        tree.create_domain("a", PowerOps::Noop, &[]).unwrap();
        assert!(matches!(
            tree.create_domain("a", PowerOps::Noop, &[]),
            Err(PdError::TreeConstructionFailure(_))
        ));
        let many = [IdleState::default(); 9];
        assert!(matches!(
            tree.create_domain("b", PowerOps::Noop, &many),
            Err(PdError::TreeConstructionFailure(_))
        ));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_links() {
        let f = fixture();
        assert_eq!(f.tree.parent(f.core0), Some(f.cluster0));
        assert_eq!(f.tree.children(f.cluster0), std::vec![f.core0, f.core1]);
        assert_eq!(f.tree.ancestors(f.core2), std::vec![f.cluster1, f.system]);
        assert!(f.tree.ancestors(f.system).is_empty());
    }

    #[test]
    fn test_link_errors() {
        let f = fixture();
        let err = |r: PdResult<()>| matches!(r, Err(PdError::TreeConstructionFailure(_)));

        assert!(err(f.tree.attach_child(f.cluster1, f.core0)));
        assert!(err(f.tree.attach_child(f.core0, f.core0)));
        assert!(err(f.tree.attach_child(f.core0, f.system)));
        assert!(err(f.tree.attach_child(f.system, DomainId::from_index(42))));
        assert_eq!(f.tree.parent(f.system), None);
    }

    #[test]
    fn test_attach_propagates_to_ancestors_only() {
        let f = fixture();
        f.tree.attach_cpu(f.core0, 0).unwrap();

        for id in [f.core0, f.cluster0, f.system] {
            assert!(f.tree.members(id).unwrap().contains(0));
        }
        for id in [f.core1, f.cluster1, f.core2] {
            assert!(!f.tree.members(id).unwrap().contains(0));
        }
        assert_eq!(f.tree.home_domain(0), Some(f.core0));
    }

    #[test]
    fn test_detach_restores_membership() {
        let f = fixture();
        f.tree.attach_cpu(f.core1, 1).unwrap();
        f.tree.attach_cpu(f.core2, 2).unwrap();
        let before = snapshot(&f.tree);

        f.tree.attach_cpu(f.core0, 0).unwrap();
        f.tree.detach_cpu(f.core0, 0).unwrap();
        assert_eq!(snapshot(&f.tree), before);

        assert_eq!(f.tree.detach_cpu(f.core0, 0), Err(PdError::DeviceNotFound));
    }

    #[test]
    fn test_detach_keeps_cpu_held_by_sibling() {
        let f = fixture();
        f.tree.attach_cpu(f.core0, 3).unwrap();
        f.tree.attach_cpu(f.core1, 3).unwrap();

        f.tree.detach_cpu(f.core0, 3).unwrap();
        assert!(!f.tree.members(f.core0).unwrap().contains(3));
        assert!(f.tree.members(f.cluster0).unwrap().contains(3));
        assert!(f.tree.members(f.system).unwrap().contains(3));
    }

    #[test]
    fn test_late_link_propagates_members() {
        let tree = DomainTree::new();
        let parent = tree.create_domain("parent", PowerOps::Noop, &[]).unwrap();
        let child = tree.create_domain("child", PowerOps::Noop, &[]).unwrap();
        tree.attach_cpu(child, 5).unwrap();
        tree.attach_child(parent, child).unwrap();
        assert_eq!(tree.members(parent), Some(CpuMask::single(5)));
    }

    #[test]
    fn test_identity_map() {
        let f = fixture();
        f.tree.register_identity(0x10, f.cluster0).unwrap();
        assert_eq!(f.tree.find_domain_by_identity(0x10), Some(f.cluster0));
        assert_eq!(f.tree.domain(f.cluster0).unwrap().node(), Some(0x10));
        assert_eq!(f.tree.find_domain_by_identity(0x11), None);

        assert!(f.tree.register_identity(0x10, f.cluster1).is_err());
        assert!(f.tree.register_identity(0x12, f.cluster0).is_err());
    }

    #[test]
    fn test_attach_out_of_range_cpu() {
        let f = fixture();
        assert_eq!(
            f.tree.attach_cpu(f.core0, MAX_CPUS as CpuId),
            Err(PdError::DeviceNotFound)
        );
    }

    #[test]
    fn test_concurrent_hotplug() {
        let f = Arc::new(fixture());
        let leaves = [f.core0, f.core1, f.core2];

        let handles: Vec<_> = (0..3u32)
            .map(|t| {
                let f = Arc::clone(&f);
                let leaf = leaves[t as usize];
                thread::spawn(move || {
                    for round in 0..200u32 {
                        let cpu = t * 8 + round % 8;
                        f.tree.attach_cpu(leaf, cpu).unwrap();
                        f.tree.detach_cpu(leaf, cpu).unwrap();
                    }
                    f.tree.attach_cpu(leaf, t).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(f.tree.members(f.system), Some(CpuMask::first(3)));
        assert_eq!(f.tree.members(f.cluster0), Some(CpuMask::first(2)));
        assert_eq!(f.tree.members(f.cluster1), Some(CpuMask::single(2)));
    }
}
