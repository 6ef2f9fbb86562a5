//! # Energy Model Store
//!
//! Boot-time selection of the platform energy model and read-only lookups
//! afterwards.
//!
//! A platform without a matching model is a normal configuration: every
//! lookup then answers `None` and energy-aware callers fall back to
//! capacity-only decisions.

use core::fmt;

use helix_hal::{CpuId, CpuTopology};
use spin::Once;

use crate::model::{EnergyKind, EnergyModel, GroupEnergy, NR_CLUSTER_SLOTS};
use crate::platforms::{PlatformMatch, MODEL_MATCHES};

// =============================================================================
// ERRORS
// =============================================================================

/// Energy store error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyError {
    /// A model was already installed for this boot
    AlreadyInstalled,
}

impl fmt::Display for EnergyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnergyError::AlreadyInstalled => write!(f, "energy model already installed"),
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

/// Match the platform's compatible strings against the model registry.
///
/// Registry order decides: the first registered platform that matches any
/// of `compatibles` is selected.
pub fn load(compatibles: &[&str]) -> Option<&'static EnergyModel> {
    find_platform(compatibles).map(|m| m.model)
}

fn find_platform(compatibles: &[&str]) -> Option<&'static PlatformMatch> {
    MODEL_MATCHES
        .iter()
        .find(|m| compatibles.contains(&m.compatible))
}

/// Read-only view of the selected energy model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyModelStore {
    model: Option<&'static EnergyModel>,
    platform: Option<&'static str>,
}

impl EnergyModelStore {
    /// Select the model for a platform
    pub fn new(compatibles: &[&str]) -> Self {
        match find_platform(compatibles) {
            Some(m) => {
                log::debug!("Energy: using model for {}", m.compatible);
                Self {
                    model: Some(m.model),
                    platform: Some(m.compatible),
                }
            },
            None => {
                log::info!("Energy: no model for this platform, energy-aware placement disabled");
                Self::empty()
            },
        }
    }

    /// Store with no energy data
    pub const fn empty() -> Self {
        Self {
            model: None,
            platform: None,
        }
    }

    /// Selected model
    pub const fn model(&self) -> Option<&'static EnergyModel> {
        self.model
    }

    /// Compatible string the model was selected by
    pub const fn platform(&self) -> Option<&'static str> {
        self.platform
    }

    /// Check if any energy data is available
    pub const fn has_data(&self) -> bool {
        self.model.is_some()
    }

    /// Energy entry for `kind` in cluster `cluster_id`
    pub fn lookup(&self, kind: EnergyKind, cluster_id: usize) -> Option<&'static GroupEnergy> {
        if cluster_id >= NR_CLUSTER_SLOTS {
            return None;
        }
        self.model.and_then(|m| m.table(kind)[cluster_id])
    }

    fn cpu_lookup(
        &self,
        kind: EnergyKind,
        cpu: CpuId,
        topology: &CpuTopology,
    ) -> Option<&'static GroupEnergy> {
        let cluster = topology.cluster_id(cpu)?;
        self.lookup(kind, cluster as usize)
    }

    /// Per-core energy of the cluster `cpu` belongs to
    pub fn cpu_core_energy(&self, cpu: CpuId, topology: &CpuTopology) -> Option<&'static GroupEnergy> {
        self.cpu_lookup(EnergyKind::Core, cpu, topology)
    }

    /// Per-cluster energy of the cluster `cpu` belongs to
    pub fn cpu_cluster_energy(
        &self,
        cpu: CpuId,
        topology: &CpuTopology,
    ) -> Option<&'static GroupEnergy> {
        self.cpu_lookup(EnergyKind::Cluster, cpu, topology)
    }

    /// System energy seen from `cpu`
    pub fn cpu_system_energy(
        &self,
        cpu: CpuId,
        topology: &CpuTopology,
    ) -> Option<&'static GroupEnergy> {
        self.cpu_lookup(EnergyKind::System, cpu, topology)
    }

    /// Busy power of running `util` on one core of `cluster_id`, core plus
    /// cluster cost.
    ///
    /// `None` means no data for that cluster; callers compare capacity only.
    pub fn estimate_placement(&self, cluster_id: usize, util: u64) -> Option<u64> {
        let core = self
            .lookup(EnergyKind::Core, cluster_id)
            .and_then(|e| e.busy_power(util));
        let cluster = self
            .lookup(EnergyKind::Cluster, cluster_id)
            .and_then(|e| e.busy_power(util));

        match (core, cluster) {
            (None, None) => None,
            (core, cluster) => Some(core.unwrap_or(0) + cluster.unwrap_or(0)),
        }
    }
}

impl Default for EnergyModelStore {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// GLOBAL STORE
// =============================================================================

static GLOBAL: Once<EnergyModelStore> = Once::new();
static EMPTY: EnergyModelStore = EnergyModelStore::empty();

/// Install the boot-time store. Only the first call succeeds.
pub fn install(store: EnergyModelStore) -> Result<&'static EnergyModelStore, EnergyError> {
    let mut installed = false;
    let current = GLOBAL.call_once(|| {
        installed = true;
        store
    });

    if installed {
        Ok(current)
    } else {
        log::warn!("Energy: model already installed, ignoring");
        Err(EnergyError::AlreadyInstalled)
    }
}

/// Installed store, or an empty one before boot selection ran
pub fn global() -> &'static EnergyModelStore {
    GLOBAL.get().unwrap_or(&EMPTY)
}
