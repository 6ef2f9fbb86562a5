//! # Platform Energy Tables
//!
//! Static energy data for the supported platforms. Idle-state costs follow
//! the platform's idle-state enumeration:
//!
//! | Index | State                        |
//! |-------|------------------------------|
//! | 0     | active idle (WFI from idle)  |
//! | 1     | WFI                          |
//! | 2     | cpu-sleep                    |
//! | 3     | cluster-sleep                |

use static_assertions::const_assert;

use crate::model::{caps_ascending, CapacityState, EnergyModel, GroupEnergy, IdleStateCost};

// =============================================================================
// TABLES
// =============================================================================

const IDLE_CLUSTER_JUNO_A53: [IdleStateCost; 4] = [
    IdleStateCost { power: 56 },
    IdleStateCost { power: 56 },
    IdleStateCost { power: 56 },
    IdleStateCost { power: 17 },
];

const IDLE_CLUSTER_JUNO_A57: [IdleStateCost; 4] = [
    IdleStateCost { power: 65 },
    IdleStateCost { power: 65 },
    IdleStateCost { power: 65 },
    IdleStateCost { power: 24 },
];

const CAP_CLUSTER_JUNO_A53: [CapacityState; 5] = [
    CapacityState { cap: 235, power: 26 },
    CapacityState { cap: 303, power: 30 },
    CapacityState { cap: 368, power: 39 },
    CapacityState { cap: 406, power: 47 },
    CapacityState { cap: 447, power: 57 },
];

const CAP_CLUSTER_JUNO_A57: [CapacityState; 5] = [
    CapacityState { cap: 417, power: 24 },
    CapacityState { cap: 579, power: 32 },
    CapacityState { cap: 744, power: 43 },
    CapacityState { cap: 883, power: 49 },
    CapacityState { cap: 1024, power: 64 },
];

const IDLE_CORE_JUNO_A53: [IdleStateCost; 4] = [
    IdleStateCost { power: 6 },
    IdleStateCost { power: 6 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
];

const IDLE_CORE_JUNO_A57: [IdleStateCost; 4] = [
    IdleStateCost { power: 15 },
    IdleStateCost { power: 15 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
];

const CAP_CORE_JUNO_A53: [CapacityState; 5] = [
    CapacityState { cap: 235, power: 33 },
    CapacityState { cap: 302, power: 46 },
    CapacityState { cap: 368, power: 61 },
    CapacityState { cap: 406, power: 76 },
    CapacityState { cap: 447, power: 93 },
];

const CAP_CORE_JUNO_A57: [CapacityState; 5] = [
    CapacityState { cap: 417, power: 168 },
    CapacityState { cap: 579, power: 251 },
    CapacityState { cap: 744, power: 359 },
    CapacityState { cap: 883, power: 479 },
    CapacityState { cap: 1024, power: 616 },
];

const IDLE_CLUSTER_MT8173_A53: [IdleStateCost; 4] = [
    IdleStateCost { power: 184 },
    IdleStateCost { power: 184 },
    IdleStateCost { power: 147 },
    IdleStateCost { power: 4 },
];

const IDLE_CLUSTER_MT8173_A57: [IdleStateCost; 4] = [
    IdleStateCost { power: 171 },
    IdleStateCost { power: 171 },
    IdleStateCost { power: 100 },
    IdleStateCost { power: 18 },
];

const CAP_CLUSTER_MT8173_A53: [CapacityState; 8] = [
    CapacityState { cap: 184, power: 174 },
    CapacityState { cap: 256, power: 107 },
    CapacityState { cap: 368, power: 138 },
    CapacityState { cap: 399, power: 145 },
    CapacityState { cap: 430, power: 144 },
    CapacityState { cap: 512, power: 150 },
    CapacityState { cap: 552, power: 165 },
    CapacityState { cap: 573, power: 164 },
];

const CAP_CLUSTER_MT8173_A57: [CapacityState; 8] = [
    CapacityState { cap: 256, power: 56 },
    CapacityState { cap: 358, power: 89 },
    CapacityState { cap: 512, power: 78 },
    CapacityState { cap: 614, power: 47 },
    CapacityState { cap: 716, power: 101 },
    CapacityState { cap: 819, power: 122 },
    CapacityState { cap: 921, power: 103 },
    CapacityState { cap: 1024, power: 150 },
];

const IDLE_CORE_MT8173_A53: [IdleStateCost; 4] = [
    IdleStateCost { power: 6 },
    IdleStateCost { power: 6 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
];

const IDLE_CORE_MT8173_A57: [IdleStateCost; 4] = [
    IdleStateCost { power: 15 },
    IdleStateCost { power: 15 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
];

const CAP_CORE_MT8173_A53: [CapacityState; 8] = [
    CapacityState { cap: 184, power: 57 },
    CapacityState { cap: 256, power: 156 },
    CapacityState { cap: 368, power: 255 },
    CapacityState { cap: 399, power: 299 },
    CapacityState { cap: 430, power: 339 },
    CapacityState { cap: 512, power: 472 },
    CapacityState { cap: 552, power: 529 },
    CapacityState { cap: 573, power: 574 },
];

const CAP_CORE_MT8173_A57: [CapacityState; 8] = [
    CapacityState { cap: 256, power: 316 },
    CapacityState { cap: 358, power: 374 },
    CapacityState { cap: 512, power: 640 },
    CapacityState { cap: 614, power: 885 },
    CapacityState { cap: 716, power: 1079 },
    CapacityState { cap: 819, power: 1376 },
    CapacityState { cap: 921, power: 1738 },
    CapacityState { cap: 1024, power: 2207 },
];

const IDLE_CLUSTER_MT6797_LL: [IdleStateCost; 4] = [
    IdleStateCost { power: 184 },
    IdleStateCost { power: 184 },
    IdleStateCost { power: 147 },
    IdleStateCost { power: 4 },
];

const IDLE_CLUSTER_MT6797_L: [IdleStateCost; 4] = [
    IdleStateCost { power: 184 },
    IdleStateCost { power: 184 },
    IdleStateCost { power: 147 },
    IdleStateCost { power: 4 },
];

const IDLE_CLUSTER_MT6797_B: [IdleStateCost; 4] = [
    IdleStateCost { power: 171 },
    IdleStateCost { power: 171 },
    IdleStateCost { power: 100 },
    IdleStateCost { power: 18 },
];

const CAP_CLUSTER_MT6797_LL: [CapacityState; 8] = [
    CapacityState { cap: 184, power: 174 },
    CapacityState { cap: 256, power: 107 },
    CapacityState { cap: 368, power: 138 },
    CapacityState { cap: 399, power: 145 },
    CapacityState { cap: 430, power: 144 },
    CapacityState { cap: 512, power: 150 },
    CapacityState { cap: 552, power: 165 },
    CapacityState { cap: 573, power: 164 },
];

const CAP_CLUSTER_MT6797_L: [CapacityState; 8] = [
    CapacityState { cap: 184, power: 174 },
    CapacityState { cap: 256, power: 107 },
    CapacityState { cap: 368, power: 138 },
    CapacityState { cap: 399, power: 145 },
    CapacityState { cap: 430, power: 144 },
    CapacityState { cap: 512, power: 150 },
    CapacityState { cap: 552, power: 165 },
    CapacityState { cap: 573, power: 164 },
];

const CAP_CLUSTER_MT6797_B: [CapacityState; 8] = [
    CapacityState { cap: 256, power: 56 },
    CapacityState { cap: 358, power: 89 },
    CapacityState { cap: 512, power: 78 },
    CapacityState { cap: 614, power: 47 },
    CapacityState { cap: 716, power: 101 },
    CapacityState { cap: 819, power: 122 },
    CapacityState { cap: 921, power: 103 },
    CapacityState { cap: 1024, power: 150 },
];

const IDLE_CORE_MT6797_LL: [IdleStateCost; 4] = [
    IdleStateCost { power: 6 },
    IdleStateCost { power: 6 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
];

const IDLE_CORE_MT6797_L: [IdleStateCost; 4] = [
    IdleStateCost { power: 6 },
    IdleStateCost { power: 6 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
];

const IDLE_CORE_MT6797_B: [IdleStateCost; 4] = [
    IdleStateCost { power: 15 },
    IdleStateCost { power: 15 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
];

const CAP_CORE_MT6797_LL: [CapacityState; 8] = [
    CapacityState { cap: 184, power: 57 },
    CapacityState { cap: 256, power: 156 },
    CapacityState { cap: 368, power: 255 },
    CapacityState { cap: 399, power: 299 },
    CapacityState { cap: 430, power: 339 },
    CapacityState { cap: 512, power: 472 },
    CapacityState { cap: 552, power: 529 },
    CapacityState { cap: 573, power: 574 },
];

const CAP_CORE_MT6797_L: [CapacityState; 8] = [
    CapacityState { cap: 184, power: 57 },
    CapacityState { cap: 256, power: 156 },
    CapacityState { cap: 368, power: 255 },
    CapacityState { cap: 399, power: 299 },
    CapacityState { cap: 430, power: 339 },
    CapacityState { cap: 512, power: 472 },
    CapacityState { cap: 552, power: 529 },
    CapacityState { cap: 573, power: 574 },
];

const CAP_CORE_MT6797_B: [CapacityState; 8] = [
    CapacityState { cap: 256, power: 316 },
    CapacityState { cap: 358, power: 374 },
    CapacityState { cap: 512, power: 640 },
    CapacityState { cap: 614, power: 885 },
    CapacityState { cap: 716, power: 1079 },
    CapacityState { cap: 819, power: 1376 },
    CapacityState { cap: 921, power: 1738 },
    CapacityState { cap: 1024, power: 2207 },
];

const IDLE_SYSTEM_HIKEY: [IdleStateCost; 4] = [
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
];

const CAP_SYSTEM_HIKEY: [CapacityState; 1] = [
    CapacityState { cap: 1024, power: 0 },
];

const IDLE_CLUSTER_HIKEY: [IdleStateCost; 4] = [
    IdleStateCost { power: 107 },
    IdleStateCost { power: 107 },
    IdleStateCost { power: 47 },
    IdleStateCost { power: 0 },
];

const CAP_CLUSTER_HIKEY: [CapacityState; 5] = [
    CapacityState { cap: 178, power: 16 },
    CapacityState { cap: 369, power: 29 },
    CapacityState { cap: 622, power: 47 },
    CapacityState { cap: 819, power: 75 },
    CapacityState { cap: 1024, power: 112 },
];

const IDLE_CORE_HIKEY: [IdleStateCost; 4] = [
    IdleStateCost { power: 15 },
    IdleStateCost { power: 15 },
    IdleStateCost { power: 0 },
    IdleStateCost { power: 0 },
];

const CAP_CORE_HIKEY: [CapacityState; 5] = [
    CapacityState { cap: 178, power: 69 },
    CapacityState { cap: 369, power: 125 },
    CapacityState { cap: 622, power: 224 },
    CapacityState { cap: 819, power: 367 },
    CapacityState { cap: 1024, power: 670 },
];

const_assert!(caps_ascending(&CAP_CLUSTER_JUNO_A53));
const_assert!(caps_ascending(&CAP_CLUSTER_JUNO_A57));
const_assert!(caps_ascending(&CAP_CORE_JUNO_A53));
const_assert!(caps_ascending(&CAP_CORE_JUNO_A57));
const_assert!(caps_ascending(&CAP_CLUSTER_MT8173_A53));
const_assert!(caps_ascending(&CAP_CLUSTER_MT8173_A57));
const_assert!(caps_ascending(&CAP_CORE_MT8173_A53));
const_assert!(caps_ascending(&CAP_CORE_MT8173_A57));
const_assert!(caps_ascending(&CAP_CLUSTER_MT6797_LL));
const_assert!(caps_ascending(&CAP_CLUSTER_MT6797_L));
const_assert!(caps_ascending(&CAP_CLUSTER_MT6797_B));
const_assert!(caps_ascending(&CAP_CORE_MT6797_LL));
const_assert!(caps_ascending(&CAP_CORE_MT6797_L));
const_assert!(caps_ascending(&CAP_CORE_MT6797_B));
const_assert!(caps_ascending(&CAP_SYSTEM_HIKEY));
const_assert!(caps_ascending(&CAP_CLUSTER_HIKEY));
const_assert!(caps_ascending(&CAP_CORE_HIKEY));

// =============================================================================
// GROUP ENERGY
// =============================================================================

static ENERGY_CLUSTER_JUNO_A53: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CLUSTER_JUNO_A53,
    cap_states: &CAP_CLUSTER_JUNO_A53,
};

static ENERGY_CLUSTER_JUNO_A57: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CLUSTER_JUNO_A57,
    cap_states: &CAP_CLUSTER_JUNO_A57,
};

static ENERGY_CORE_JUNO_A53: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CORE_JUNO_A53,
    cap_states: &CAP_CORE_JUNO_A53,
};

static ENERGY_CORE_JUNO_A57: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CORE_JUNO_A57,
    cap_states: &CAP_CORE_JUNO_A57,
};

static ENERGY_CLUSTER_MT8173_A53: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CLUSTER_MT8173_A53,
    cap_states: &CAP_CLUSTER_MT8173_A53,
};

static ENERGY_CLUSTER_MT8173_A57: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CLUSTER_MT8173_A57,
    cap_states: &CAP_CLUSTER_MT8173_A57,
};

static ENERGY_CORE_MT8173_A53: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CORE_MT8173_A53,
    cap_states: &CAP_CORE_MT8173_A53,
};

static ENERGY_CORE_MT8173_A57: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CORE_MT8173_A57,
    cap_states: &CAP_CORE_MT8173_A57,
};

static ENERGY_CLUSTER_MT6797_LL: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CLUSTER_MT6797_LL,
    cap_states: &CAP_CLUSTER_MT6797_LL,
};

static ENERGY_CLUSTER_MT6797_L: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CLUSTER_MT6797_L,
    cap_states: &CAP_CLUSTER_MT6797_L,
};

static ENERGY_CLUSTER_MT6797_B: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CLUSTER_MT6797_B,
    cap_states: &CAP_CLUSTER_MT6797_B,
};

static ENERGY_CORE_MT6797_LL: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CORE_MT6797_LL,
    cap_states: &CAP_CORE_MT6797_LL,
};

static ENERGY_CORE_MT6797_L: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CORE_MT6797_L,
    cap_states: &CAP_CORE_MT6797_L,
};

static ENERGY_CORE_MT6797_B: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CORE_MT6797_B,
    cap_states: &CAP_CORE_MT6797_B,
};

static ENERGY_SYSTEM_HIKEY: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_SYSTEM_HIKEY,
    cap_states: &CAP_SYSTEM_HIKEY,
};

static ENERGY_CLUSTER_HIKEY: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CLUSTER_HIKEY,
    cap_states: &CAP_CLUSTER_HIKEY,
};

static ENERGY_CORE_HIKEY: GroupEnergy = GroupEnergy {
    idle_states: &IDLE_CORE_HIKEY,
    cap_states: &CAP_CORE_HIKEY,
};

// =============================================================================
// PLATFORM MODELS
// =============================================================================

/// ARM Juno r0/r2: cluster 0 = Cortex-A57, cluster 1 = Cortex-A53
pub static JUNO_MODEL: EnergyModel = EnergyModel {
    core: [Some(&ENERGY_CORE_JUNO_A57), Some(&ENERGY_CORE_JUNO_A53), None],
    cluster: [Some(&ENERGY_CLUSTER_JUNO_A57), Some(&ENERGY_CLUSTER_JUNO_A53), None],
    system: [None; 3],
};

/// HiSilicon Hi6220 (HiKey): two identical Cortex-A53 clusters
pub static HIKEY_MODEL: EnergyModel = EnergyModel {
    core: [Some(&ENERGY_CORE_HIKEY), Some(&ENERGY_CORE_HIKEY), None],
    cluster: [Some(&ENERGY_CLUSTER_HIKEY), Some(&ENERGY_CLUSTER_HIKEY), None],
    system: [Some(&ENERGY_SYSTEM_HIKEY), Some(&ENERGY_SYSTEM_HIKEY), None],
};

/// MediaTek MT8173: cluster 0 = Cortex-A53, cluster 1 = Cortex-A57
pub static MT8173_MODEL: EnergyModel = EnergyModel {
    core: [Some(&ENERGY_CORE_MT8173_A53), Some(&ENERGY_CORE_MT8173_A57), None],
    cluster: [Some(&ENERGY_CLUSTER_MT8173_A53), Some(&ENERGY_CLUSTER_MT8173_A57), None],
    system: [None; 3],
};

/// MediaTek MT6797: three clusters (LL, L, big)
pub static MT6797_MODEL: EnergyModel = EnergyModel {
    core: [
        Some(&ENERGY_CORE_MT6797_LL),
        Some(&ENERGY_CORE_MT6797_L),
        Some(&ENERGY_CORE_MT6797_B),
    ],
    cluster: [
        Some(&ENERGY_CLUSTER_MT6797_LL),
        Some(&ENERGY_CLUSTER_MT6797_L),
        Some(&ENERGY_CLUSTER_MT6797_B),
    ],
    system: [None; 3],
};

/// Platform compatible string to model mapping
#[derive(Debug)]
pub struct PlatformMatch {
    /// Root compatible string
    pub compatible: &'static str,
    /// Model used when it matches
    pub model: &'static EnergyModel,
}

/// Registry of known platforms
pub static MODEL_MATCHES: &[PlatformMatch] = &[
    PlatformMatch { compatible: "arm,juno", model: &JUNO_MODEL },
    PlatformMatch { compatible: "hisilicon,hi6220-hikey", model: &HIKEY_MODEL },
    PlatformMatch { compatible: "mediatek,mt8173", model: &MT8173_MODEL },
    PlatformMatch { compatible: "mediatek,mt6797", model: &MT6797_MODEL },
];
